//! Modal dialogs (validation notice, settings)

use super::App;
use crate::constants::*;
use crate::theme;
use crate::ui::components::styled_checkbox;
use eframe::egui;
use tracing::warn;

impl App {
    /// Blocking notice for rejected form input. Nothing else is clickable until dismissed.
    pub(crate) fn render_notice_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.notice().map(str::to_owned) else {
            return;
        };

        let modal = egui::Modal::new(egui::Id::new("validation_notice"))
            .backdrop_color(egui::Color32::from_black_alpha(180))
            .frame(theme::modal_frame());
        let response = modal.show(ctx, |ui| {
            ui.set_width(320.0);
            ui.horizontal(|ui| {
                ui.colored_label(theme::STATUS_WARNING, egui_phosphor::regular::WARNING);
                ui.label(
                    egui::RichText::new("Check the form")
                        .size(theme::FONT_HEADING)
                        .strong(),
                );
            });
            ui.add_space(theme::SPACING_SM);
            ui.label(egui::RichText::new(&message).size(theme::FONT_BODY));
            ui.add_space(theme::SPACING_LG);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add(theme::button_accent("OK")).clicked()
                    || ui.input(|i| i.key_pressed(egui::Key::Enter))
            })
            .inner
        });

        if response.inner || response.should_close() {
            self.controller.dismiss_notice();
        }
    }

    pub(crate) fn render_settings_modal(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }

        let env_override = std::env::var(SERVICE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let mut save = false;
        let mut cancel = false;

        let modal = egui::Modal::new(egui::Id::new("settings_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(180))
            .frame(theme::modal_frame());
        let response = modal.show(ctx, |ui| {
            ui.set_width(360.0);
            ui.label(
                egui::RichText::new(format!("{}  Settings", egui_phosphor::regular::GEAR))
                    .size(theme::FONT_HEADING)
                    .strong(),
            );
            ui.add_space(theme::SPACING_MD);

            // Planting service
            ui.label(egui::RichText::new("Planting Service").size(theme::FONT_LABEL).color(theme::ACCENT));
            ui.add(
                egui::TextEdit::singleline(&mut self.service_url_str)
                    .hint_text(DEFAULT_SERVICE_URL)
                    .desired_width(ui.available_width()),
            );
            if let Some(url) = &env_override {
                ui.label(
                    egui::RichText::new(format!("Overridden by {} ({})", SERVICE_URL_ENV, url))
                        .size(theme::FONT_SMALL)
                        .color(theme::STATUS_WARNING),
                );
            }
            if let Some(err) = &self.settings_error {
                ui.colored_label(theme::STATUS_ERROR, err);
            }

            ui.add_space(theme::SPACING_SM);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Poll interval").size(theme::FONT_LABEL));
                ui.add(
                    egui::DragValue::new(&mut self.poll_interval_ms)
                        .range(POLL_INTERVAL_MIN_MS..=POLL_INTERVAL_MAX_MS)
                        .speed(10)
                        .suffix(" ms"),
                );
            });

            ui.add_space(theme::SPACING_MD);
            ui.separator();

            // History
            ui.label(egui::RichText::new("History").size(theme::FONT_LABEL).color(theme::ACCENT));
            styled_checkbox(ui, &mut self.show_history, "Show recent runs");
            ui.add_space(theme::SPACING_SM);
            ui.horizontal(|ui| {
                let clear = ui.add_enabled(
                    self.controller.has_history(),
                    theme::button_danger(format!("{}  Clear History", egui_phosphor::regular::TRASH)),
                );
                if clear.clicked() {
                    self.controller.clear_history();
                }
                if ui
                    .add(theme::button(format!("{}  Open Logs", egui_phosphor::regular::FOLDER_OPEN)))
                    .clicked()
                {
                    let logs = self.logs_dir();
                    if let Err(e) = open::that(&logs) {
                        warn!(error = %e, path = %logs.display(), "Failed to open logs folder");
                    }
                }
            });

            ui.add_space(theme::SPACING_MD);
            ui.separator();
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(theme::button_accent("Save")).clicked() {
                    save = true;
                }
                if ui.add(theme::button("Cancel")).clicked() {
                    cancel = true;
                }
            });
        });

        if save {
            self.apply_service_settings();
            if self.settings_error.is_none() {
                self.show_settings = false;
            }
        } else if cancel || response.should_close() {
            // Discard edits
            let saved = crate::settings::Settings::load(&self.data_dir);
            self.service_url_str = saved.service_url;
            self.poll_interval_ms = saved.poll_interval_ms;
            self.show_history = saved.show_history;
            self.settings_error = None;
            self.show_settings = false;
        }
    }
}
