//! HTTP client for the planting service

use crate::constants::*;
use crate::error::ApiError;
use crate::types::{PlantingRequest, PlantingStatus, Progress};
use tracing::debug;

/// Thin typed wrapper over the four planting endpoints. Cheap to clone.
#[derive(Clone, Debug)]
pub struct PlantingClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlantingClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("planting-console/{}", APP_VERSION))
            .build()
            .map_err(ApiError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and reject non-2xx responses
    async fn send(
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        let status = response.status();
        debug!(endpoint, status = %status, "Planting service responded");
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }
        Ok(response)
    }

    pub async fn is_planting(&self) -> Result<bool, ApiError> {
        let endpoint = IS_PLANTING_PATH;
        let response = Self::send(endpoint, self.http.get(self.url(endpoint))).await?;
        let status: PlantingStatus = response
            .json()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })?;
        Ok(status.planting_active)
    }

    /// The response body is not used, but it must still be valid JSON
    pub async fn start_planting(&self, request: &PlantingRequest) -> Result<(), ApiError> {
        let endpoint = START_PLANTING_PATH;
        let response = Self::send(endpoint, self.http.post(self.url(endpoint)).json(request)).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })?;
        Ok(())
    }

    pub async fn stop_planting(&self) -> Result<(), ApiError> {
        let endpoint = STOP_PLANTING_PATH;
        Self::send(endpoint, self.http.post(self.url(endpoint))).await?;
        Ok(())
    }

    /// Returns `Ok(None)` when the body is JSON but lacks numeric counts
    pub async fn target_progress(&self) -> Result<Option<Progress>, ApiError> {
        let endpoint = TARGET_PROGRESS_PATH;
        let response = Self::send(endpoint, self.http.get(self.url(endpoint))).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })?;
        Ok(progress_from_json(&body))
    }
}

/// Extract `{currentProgress, targetProgress}`; both must be JSON numbers
pub fn progress_from_json(body: &serde_json::Value) -> Option<Progress> {
    let current = body.get("currentProgress")?.as_f64()?;
    let target = body.get("targetProgress")?.as_f64()?;
    Some(Progress { current, target })
}
