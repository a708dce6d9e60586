//! Application constants and configuration

pub const APP_NAME: &str = "Planting Console";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the planting service when neither settings nor env provide one
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";
pub const SERVICE_URL_ENV: &str = "PLANTING_SERVICE_URL";

pub const IS_PLANTING_PATH: &str = "/api/is_planting";
pub const START_PLANTING_PATH: &str = "/api/start_planting";
pub const STOP_PLANTING_PATH: &str = "/api/stop_planting";
pub const TARGET_PROGRESS_PATH: &str = "/api/target_progress";

pub const POLL_INTERVAL_MS: u64 = 1000;
pub const POLL_INTERVAL_MIN_MS: u64 = 250;
pub const POLL_INTERVAL_MAX_MS: u64 = 10_000;

// Fallback metrics for the progress track before the first layout pass
pub const DEFAULT_TRACK_WIDTH: f32 = 300.0;
pub const DEFAULT_MARKER_WIDTH: f32 = 24.0;

pub const PLANTING_TITLE: &str = "Planting in Progress";
pub const COMPLETE_TITLE: &str = "Planting Complete!";
pub const VALIDATION_NOTICE: &str = "Please enter positive values for all numeric fields.";
pub const START_FAILED_MESSAGE: &str = "Unable to start planting. Please try again.";
pub const POLL_FAILED_MESSAGE: &str =
    "Lost contact with the planting device. Progress updates have stopped.";

pub const HISTORY_LIMIT: usize = 20;
