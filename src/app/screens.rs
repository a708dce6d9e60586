//! Screen rendering (input form, planting progress, run history)

use super::App;
use crate::constants::*;
use crate::theme;
use crate::ui::components::{error_banner, labeled_field, progress_track, styled_checkbox};
use crate::utils::{format_number, format_timestamp};
use eframe::egui;
use tracing::debug;

impl App {
    pub(crate) fn render_input_screen(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.set_max_width(theme::FORM_WIDTH);
            ui.add_space(theme::SPACING_XL);

            theme::card_frame().show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical(|ui| {
                    ui.label(
                        egui::RichText::new(format!("{}  New Planting Run", egui_phosphor::regular::PLANT))
                            .size(theme::FONT_TITLE)
                            .color(theme::TEXT_PRIMARY)
                            .strong(),
                    );
                    ui.label(
                        egui::RichText::new("Plot size and spacing, in metres")
                            .size(theme::FONT_LABEL)
                            .color(theme::TEXT_MUTED),
                    );
                    ui.add_space(theme::SPACING_MD);

                    let mut submit = false;
                    {
                        let form = &mut self.controller.form;
                        let fields = [
                            ("Plot width (x)", "e.g. 2", &mut form.x),
                            ("Plot length (y)", "e.g. 3", &mut form.y),
                            ("Column separation", "e.g. 0.5", &mut form.column_separation),
                            ("Seed spacing", "e.g. 0.1", &mut form.seed_spacing),
                        ];
                        for (label, hint, value) in fields {
                            let response = labeled_field(ui, label, hint, value);
                            // Consumed so the notice raised by this submit can't also be dismissed by it
                            if response.lost_focus()
                                && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter))
                            {
                                submit = true;
                            }
                        }
                        ui.add_space(theme::SPACING_SM);
                        styled_checkbox(ui, &mut form.dispense_water, "Dispense water");
                    }

                    if let Some(message) = self.controller.inline_error() {
                        ui.add_space(theme::SPACING_SM);
                        ui.colored_label(theme::STATUS_ERROR, message);
                    }

                    ui.add_space(theme::SPACING_MD);
                    let pending = self.controller.is_start_pending();
                    let label = if pending {
                        "Starting...".to_string()
                    } else {
                        format!("{}  Start Planting", egui_phosphor::regular::PLAY)
                    };
                    let start = ui.add_enabled(
                        !pending,
                        theme::button_accent(label)
                            .min_size(egui::vec2(ui.available_width(), theme::BUTTON_HEIGHT_LARGE)),
                    );
                    if start.clicked() || (submit && !pending) {
                        if let Err(e) = self.controller.start_planting() {
                            debug!(field = e.field(), "Start blocked, showing validation notice");
                        }
                    }
                });
            });

            if self.show_history {
                self.render_history(ui);
            }
        });
    }

    pub(crate) fn render_planting_screen(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.set_max_width(theme::FORM_WIDTH);
            ui.add_space(theme::SPACING_XL);

            theme::card_frame().show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical(|ui| {
                    let complete = self.controller.is_complete();
                    let title_color = if complete { theme::ACCENT } else { theme::TEXT_PRIMARY };
                    ui.label(
                        egui::RichText::new(self.controller.heading())
                            .size(theme::FONT_TITLE)
                            .color(title_color)
                            .strong(),
                    );

                    let progress = self.controller.progress();
                    if progress.target > 0.0 {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} of {} planted",
                                format_number(progress.current),
                                format_number(progress.target)
                            ))
                            .size(theme::FONT_LABEL)
                            .color(theme::TEXT_MUTED),
                        );
                    } else if self.controller.is_polling() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(
                                egui::RichText::new("Waiting for the planter...")
                                    .size(theme::FONT_LABEL)
                                    .color(theme::TEXT_MUTED),
                            );
                        });
                    }
                    ui.add_space(theme::SPACING_LG);

                    let track_width = ui.available_width();
                    self.controller.set_bar_metrics(track_width, theme::MARKER_SIZE);
                    let bar = self.controller.bar();
                    progress_track(ui, &bar, track_width, self.leaf_texture.as_ref());

                    if self.controller.error_banner_visible() {
                        ui.add_space(theme::SPACING_MD);
                        error_banner(ui, POLL_FAILED_MESSAGE);
                    }

                    ui.add_space(theme::SPACING_LG);
                    let size = egui::vec2(ui.available_width(), theme::BUTTON_HEIGHT_LARGE);
                    if complete {
                        let home = theme::button_accent(format!("{}  Return Home", egui_phosphor::regular::HOUSE))
                            .min_size(size);
                        if ui.add(home).clicked() {
                            self.controller.return_home();
                        }
                    } else {
                        let stopping = self.controller.is_stop_pending();
                        let label = if stopping {
                            "Stopping...".to_string()
                        } else {
                            format!("{}  Stop Planting", egui_phosphor::regular::STOP)
                        };
                        let stop = ui.add_enabled(!stopping, theme::button_danger(label).min_size(size));
                        if stop.clicked() {
                            self.controller.stop_planting();
                        }
                    }
                });
            });
        });
    }

    fn render_history(&mut self, ui: &mut egui::Ui) {
        use egui_extras::{Column, TableBuilder};

        if !self.controller.has_history() {
            return;
        }
        self.refresh_history();

        ui.add_space(theme::SPACING_XL);
        theme::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(format!(
                    "{}  Recent Runs",
                    egui_phosphor::regular::CLOCK_COUNTER_CLOCKWISE
                ))
                .size(theme::FONT_HEADING)
                .strong(),
            );

            if self.history_cache.is_empty() {
                ui.label(
                    egui::RichText::new("No planting runs yet")
                        .size(theme::FONT_LABEL)
                        .color(theme::TEXT_DIM),
                );
                return;
            }

            TableBuilder::new(ui)
                .striped(true)
                .resizable(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .max_scroll_height(220.0)
                .column(Column::auto().at_least(110.0))
                .column(Column::auto().at_least(60.0))
                .column(Column::auto().at_least(70.0))
                .column(Column::exact(24.0))
                .column(Column::remainder())
                .header(22.0, |mut header| {
                    for title in ["STARTED", "PLOT", "SPACING", "", "OUTCOME"] {
                        header.col(|ui| {
                            ui.label(
                                egui::RichText::new(title)
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            );
                        });
                    }
                })
                .body(|mut body| {
                    for run in &self.history_cache {
                        body.row(22.0, |mut row| {
                            let small = |text: String| egui::RichText::new(text).size(theme::FONT_LABEL);
                            row.col(|ui| {
                                ui.label(small(format_timestamp(&run.started_at)));
                            });
                            row.col(|ui| {
                                ui.label(small(format!(
                                    "{} × {}",
                                    format_number(run.request.x),
                                    format_number(run.request.y)
                                )));
                            });
                            row.col(|ui| {
                                ui.label(small(format!(
                                    "{} / {}",
                                    format_number(run.request.column_separation),
                                    format_number(run.request.seed_spacing)
                                )));
                            });
                            row.col(|ui| {
                                if run.request.dispense_water {
                                    ui.colored_label(theme::ACCENT, egui_phosphor::regular::DROP)
                                        .on_hover_text("Water dispensed");
                                }
                            });
                            row.col(|ui| {
                                let outcome = run.outcome.map(|o| o.as_str()).unwrap_or("running");
                                let text = match run.progress {
                                    Some(p) => format!(
                                        "{} ({}/{})",
                                        outcome,
                                        format_number(p.current),
                                        format_number(p.target)
                                    ),
                                    None => outcome.to_string(),
                                };
                                ui.label(small(text).color(theme::outcome_color(run.outcome)));
                            });
                        });
                    }
                });
        });
    }
}
