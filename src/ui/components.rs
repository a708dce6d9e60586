//! Reusable UI components
//!
//! Standalone widgets shared by the input and planting screens.

use crate::progress::{BarLayout, FillCorners};
use crate::theme;
use eframe::egui;

/// Corner radius of the filled part of the track
fn fill_corner_radius(corners: FillCorners) -> egui::CornerRadius {
    let r = theme::RADIUS_TRACK;
    match corners {
        FillCorners::Square => egui::CornerRadius::ZERO,
        FillCorners::LeftRounded => egui::CornerRadius { nw: r, sw: r, ne: 0, se: 0 },
        FillCorners::Rounded => egui::CornerRadius::same(r),
    }
}

/// Paint the progress track, its fill and the leaf marker.
///
/// `layout.marker_offset` must have been computed for `track_width`.
pub fn progress_track(
    ui: &mut egui::Ui,
    layout: &BarLayout,
    track_width: f32,
    marker: Option<&egui::TextureHandle>,
) -> egui::Response {
    let marker_size = theme::MARKER_SIZE;
    let total_height = theme::TRACK_HEIGHT + marker_size * 0.75;
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(track_width, total_height), egui::Sense::hover());

    if !ui.is_rect_visible(rect) {
        return response;
    }

    let painter = ui.painter();
    let track = egui::Rect::from_min_size(
        egui::pos2(rect.min.x, rect.max.y - theme::TRACK_HEIGHT),
        egui::vec2(track_width, theme::TRACK_HEIGHT),
    );
    painter.rect_filled(track, egui::CornerRadius::same(theme::RADIUS_TRACK), theme::TRACK_BG);

    let fill_width = layout.fill_width(track_width);
    if fill_width > 0.0 {
        let fill = egui::Rect::from_min_size(track.min, egui::vec2(fill_width, theme::TRACK_HEIGHT));
        painter.rect_filled(fill, fill_corner_radius(layout.corners), theme::TRACK_FILL);
    }

    // Leaf sits on top of the track, overlapping its upper half
    let marker_rect = egui::Rect::from_min_size(
        egui::pos2(track.min.x + layout.marker_offset, track.center().y - marker_size),
        egui::vec2(marker_size, marker_size),
    );
    match marker {
        Some(texture) => {
            painter.image(
                texture.id(),
                marker_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.text(
                marker_rect.center(),
                egui::Align2::CENTER_CENTER,
                egui_phosphor::regular::LEAF,
                egui::FontId::proportional(marker_size),
                theme::ACCENT,
            );
        }
    }

    painter.text(
        track.center(),
        egui::Align2::CENTER_CENTER,
        format!("{:.0}%", layout.percent),
        egui::FontId::proportional(theme::FONT_LABEL),
        theme::TEXT_PRIMARY,
    );

    response
}

/// Label + single-line numeric text field on one row
pub fn labeled_field(ui: &mut egui::Ui, label: &str, hint: &str, value: &mut String) -> egui::Response {
    ui.horizontal(|ui| {
        ui.add_sized(
            [theme::FIELD_LABEL_WIDTH, 24.0],
            egui::Label::new(
                egui::RichText::new(label)
                    .size(theme::FONT_BODY)
                    .color(theme::TEXT_SECONDARY),
            ),
        );
        ui.add(
            egui::TextEdit::singleline(value)
                .hint_text(hint)
                .desired_width(ui.available_width())
                .font(egui::FontId::proportional(theme::FONT_BODY)),
        )
    })
    .inner
}

/// Custom checkbox widget with a label. Toggles `selected` when clicked.
pub fn styled_checkbox(ui: &mut egui::Ui, selected: &mut bool, label: &str) -> egui::Response {
    let size = theme::CHECKBOX_SIZE;
    let label_galley = ui.painter().layout_no_wrap(
        label.to_string(),
        egui::FontId::proportional(theme::FONT_BODY),
        theme::TEXT_SECONDARY,
    );
    let width = size + theme::SPACING_MD + label_galley.size().x;
    let (rect, mut response) =
        ui.allocate_exact_size(egui::vec2(width, size.max(label_galley.size().y)), egui::Sense::click());

    if response.clicked() {
        *selected = !*selected;
        response.mark_changed();
    }

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        let rounding = 3.0;
        let box_rect = egui::Rect::from_min_size(
            egui::pos2(rect.min.x, rect.center().y - size / 2.0),
            egui::vec2(size, size),
        );

        if *selected {
            painter.rect_filled(box_rect, rounding, theme::ACCENT);
            painter.text(
                box_rect.center(),
                egui::Align2::CENTER_CENTER,
                egui_phosphor::regular::CHECK,
                egui::FontId::proportional(size * 0.7),
                theme::ACCENT_DARK,
            );
        } else {
            let stroke_color = if response.hovered() {
                theme::ACCENT
            } else {
                theme::BORDER_DEFAULT
            };
            painter.rect_stroke(
                box_rect,
                rounding,
                egui::Stroke::new(theme::STROKE_MEDIUM, stroke_color),
                egui::StrokeKind::Inside,
            );
        }

        painter.galley(
            egui::pos2(box_rect.max.x + theme::SPACING_MD, rect.center().y - label_galley.size().y / 2.0),
            label_galley,
            theme::TEXT_SECONDARY,
        );
    }

    response
}

/// Persistent red banner with a warning icon
pub fn error_banner(ui: &mut egui::Ui, message: &str) {
    egui::Frame::new()
        .fill(theme::STATUS_ERROR_BG)
        .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, theme::STATUS_ERROR))
        .corner_radius(theme::RADIUS_DEFAULT)
        .inner_margin(egui::Margin::symmetric(12, 8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal_wrapped(|ui| {
                ui.colored_label(theme::STATUS_ERROR, egui_phosphor::regular::WARNING);
                ui.colored_label(theme::STATUS_ERROR, message);
            });
        });
}
