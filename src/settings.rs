//! User settings stored as settings.json in the app data directory

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,

    // Planting service
    pub service_url: String,
    pub poll_interval_ms: u64,

    // View
    pub show_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            poll_interval_ms: POLL_INTERVAL_MS,
            show_history: true,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join("settings.json");
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    /// Service URL with the environment override applied
    pub fn effective_service_url(&self) -> String {
        Self::resolve_service_url(std::env::var(SERVICE_URL_ENV).ok(), &self.service_url)
    }

    fn resolve_service_url(env_value: Option<String>, stored: &str) -> String {
        match env_value.map(|v| v.trim().to_string()) {
            Some(url) if !url.is_empty() => url,
            _ if stored.trim().is_empty() => DEFAULT_SERVICE_URL.to_string(),
            _ => stored.trim().to_string(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS),
        )
    }
}
