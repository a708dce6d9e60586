//! App module - contains the main application state and logic

mod modals;
mod screens;

use crate::api::PlantingClient;
use crate::constants::*;
use crate::controller::Controller;
use crate::db::{Database, RunRecord};
use crate::settings::Settings;
use crate::theme;
use crate::utils::{rasterize_svg, LEAF_SVG};
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) controller: Controller,
    // Owns the worker threads behind the controller's runtime handle
    pub(crate) _runtime: tokio::runtime::Runtime,
    pub(crate) leaf_texture: Option<egui::TextureHandle>,
    pub(crate) session_checked: bool,
    // Settings (editable copies)
    pub(crate) service_url_str: String,
    pub(crate) poll_interval_ms: u64,
    pub(crate) show_history: bool,
    pub(crate) show_settings: bool,
    pub(crate) settings_error: Option<String>,
    // History cache, refreshed when the controller's history version moves
    pub(crate) history_cache: Vec<RunRecord>,
    pub(crate) history_cache_version: Option<u64>,
    // Window
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) data_dir: PathBuf,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Phosphor icons
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let runtime = tokio::runtime::Runtime::new()?;

        let service_url = settings.effective_service_url();
        let client = PlantingClient::new(service_url.as_str())?;
        info!(url = %service_url, "Using planting service");

        let db_path = data_dir.join("history.db");
        let history = match Database::open(&db_path) {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = %e, path = %db_path.display(), "Run history unavailable");
                None
            }
        };

        let controller = Controller::new(
            client,
            runtime.handle().clone(),
            cc.egui_ctx.clone(),
            settings.poll_interval(),
            history,
        );

        let leaf_texture = rasterize_svg(LEAF_SVG, 64).map(|(rgba, w, h)| {
            cc.egui_ctx.load_texture(
                "leaf_marker",
                egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &rgba),
                egui::TextureOptions::LINEAR,
            )
        });

        Ok(Self {
            controller,
            _runtime: runtime,
            leaf_texture,
            session_checked: false,
            service_url_str: settings.service_url.clone(),
            poll_interval_ms: settings.poll_interval_ms,
            show_history: settings.show_history,
            show_settings: false,
            settings_error: None,
            history_cache: Vec::new(),
            history_cache_version: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
            data_dir,
        })
    }

    pub fn current_settings(&self) -> Settings {
        Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            service_url: self.service_url_str.trim().to_string(),
            poll_interval_ms: self.poll_interval_ms,
            show_history: self.show_history,
        }
    }

    pub fn save_settings(&self) {
        self.current_settings().save(&self.data_dir);
    }

    /// Apply edited service settings: new poll interval, and a fresh client
    /// plus session check if the URL changed.
    pub fn apply_service_settings(&mut self) {
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS);
        let settings = self.current_settings();
        self.controller.set_poll_interval(settings.poll_interval());

        let url = settings.effective_service_url();
        if url.trim_end_matches('/') != self.controller.service_url() {
            match PlantingClient::new(url.as_str()) {
                Ok(client) => {
                    self.controller.set_client(client);
                    self.controller.check_active_session();
                    self.settings_error = None;
                }
                Err(e) => {
                    error!(error = %e, "Failed to create planting client");
                    self.settings_error = Some(e.to_string());
                }
            }
        }

        settings.save(&self.data_dir);
    }

    pub fn refresh_history(&mut self) {
        let version = self.controller.history_version();
        if self.history_cache_version == Some(version) {
            return;
        }
        self.history_cache = self.controller.recent_runs(HISTORY_LIMIT);
        self.history_cache_version = Some(version);
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
