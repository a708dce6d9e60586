//! Common types and data structures

use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Which screen is visible
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UiMode {
    #[default]
    Input,
    Planting,
}

/// Body of `POST /api/start_planting`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingRequest {
    pub x: f64,
    pub y: f64,
    pub column_separation: f64,
    pub seed_spacing: f64,
    pub dispense_water: bool,
}

/// Response of `GET /api/is_planting`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingStatus {
    pub planting_active: bool,
}

/// Progress counts as reported by the service
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Progress {
    pub current: f64,
    pub target: f64,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

/// Results of background service calls, applied on the UI thread
#[derive(Debug)]
pub enum ServiceEvent {
    SessionCheck(Result<bool, ApiError>),
    StartFinished {
        request: PlantingRequest,
        result: Result<(), ApiError>,
    },
    StopFinished(Result<(), ApiError>),
    /// `Ok(None)` is a well-formed JSON body without numeric counts
    Progress {
        generation: u64,
        result: Result<Option<Progress>, ApiError>,
    },
}
