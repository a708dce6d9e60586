//! Utility functions

use crate::constants::APP_NAME;
use std::path::PathBuf;

// Leaf marker riding on the progress bar; also used for the window icon
pub const LEAF_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64"><path fill="#4ade80" stroke="#14532d" stroke-width="2" d="M8 56C8 28 24 8 58 6c-2 34-22 50-50 50z"/><path fill="none" stroke="#14532d" stroke-width="3" stroke-linecap="round" d="M10 54C22 40 34 28 46 18"/></svg>"##;

/// Rasterize an SVG into a square straight-alpha RGBA buffer.
/// Returns `None` if the SVG fails to parse or `size` is zero.
pub fn rasterize_svg(svg: &str, size: u32) -> Option<(Vec<u8>, u32, u32)> {
    let tree = resvg::usvg::Tree::from_str(svg, &resvg::usvg::Options::default()).ok()?;
    let scale = size as f32 / tree.size().width();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)?;
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Some((premul_to_straight(&pixmap), size, size))
}

fn premul_to_straight(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let a = p.alpha();
            if a == 0 {
                [0, 0, 0, 0]
            } else {
                let r = (p.red() as u16 * 255 / a as u16) as u8;
                let g = (p.green() as u16 * 255 / a as u16) as u8;
                let b = (p.blue() as u16 * 255 / a as u16) as u8;
                [r, g, b, a]
            }
        })
        .collect()
}

/// Get the app data directory (settings, logs, history)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Format a measurement without trailing zeros ("2", "0.5", "0.125")
pub fn format_number(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// RFC 3339 timestamp as local "YYYY-MM-DD HH:MM", or the input if it doesn't parse
pub fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.125), "0.125");
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(0.0001), "0");
    }

    #[test]
    fn bad_timestamp_passes_through() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        let formatted = format_timestamp("2026-03-01T08:30:00+00:00");
        assert_eq!(formatted.len(), "2026-03-01 08:30".len());
    }

    #[test]
    fn leaf_rasterizes_to_requested_size() {
        let (rgba, w, h) = rasterize_svg(LEAF_SVG, 32).expect("leaf svg");
        assert_eq!((w, h), (32, 32));
        assert_eq!(rgba.len(), 32 * 32 * 4);
        assert!(rgba.chunks(4).any(|px| px[3] > 0));
        // Leaf fill is green, so the hex colors made it into the markup
        assert!(LEAF_SVG.ends_with("</svg>"));
        assert!(rgba
            .chunks(4)
            .any(|px| px[3] == 255 && px[1] > px[0] && px[1] > px[2]));
        assert!(rasterize_svg("<not svg>", 32).is_none());
        assert!(rasterize_svg(LEAF_SVG, 0).is_none());
    }
}
