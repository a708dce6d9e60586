//! Progress bar geometry
//!
//! Turns a (current, target) pair into the fill percentage, the leaf marker's
//! horizontal offset and the corner style of the fill. Painting lives in
//! `ui::components::progress_track`.

/// Corner rounding of the filled part of the track
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillCorners {
    /// Empty bar
    #[default]
    Square,
    /// Partially filled: rounded on the left, flat where the fill ends
    LeftRounded,
    /// Full bar
    Rounded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BarLayout {
    /// Fill percentage in [0, 100]
    pub percent: f32,
    /// Marker left edge in pixels from the track's left edge
    pub marker_offset: f32,
    pub corners: FillCorners,
}

impl BarLayout {
    /// Returns `None` when there is nothing to render (target zero, negative or NaN).
    pub fn compute(current: f64, target: f64, track_width: f32, marker_width: f32) -> Option<Self> {
        if !(target > 0.0) {
            return None;
        }

        let ratio = current / target * 100.0;
        let percent = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 100.0) as f32 };

        let centered = percent / 100.0 * track_width - marker_width / 2.0;
        let marker_offset = centered.min(track_width - marker_width).max(0.0);

        let corners = if percent >= 100.0 {
            FillCorners::Rounded
        } else if percent <= 0.0 {
            FillCorners::Square
        } else {
            FillCorners::LeftRounded
        };

        Some(Self { percent, marker_offset, corners })
    }

    pub fn fill_fraction(&self) -> f32 {
        self.percent / 100.0
    }

    pub fn fill_width(&self, track_width: f32) -> f32 {
        track_width * self.fill_fraction()
    }
}
