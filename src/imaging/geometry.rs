//! Pure placement and sizing arithmetic.
//!
//! All functions here are pure and testable without any engine or pixels.

use super::backend::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of nine relative positions on a container: corners, edge centers, center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MidLeft,
    #[serde(alias = "center")]
    MidCenter,
    MidRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MidLeft,
        Anchor::MidCenter,
        Anchor::MidRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Map a legacy row-major integer code (0 = top-left ... 8 = bottom-right).
    ///
    /// Unknown codes fall back to [`Anchor::TopLeft`].
    pub fn from_index(code: i64) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Anchor::TopLeft)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::MidLeft => "mid-left",
            Anchor::MidCenter => "mid-center",
            Anchor::MidRight => "mid-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        if normalized == "center" {
            return Ok(Anchor::MidCenter);
        }
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| format!("unknown anchor '{s}'"))
    }
}

/// Top-left offset that puts `overlay` at `anchor` inside `container`.
///
/// Centered axes use truncating integer division. Offsets go negative when the
/// overlay is larger than the container; they are never clamped.
///
/// # Examples
/// ```
/// # use placard::imaging::{placement_coordinates, Anchor, Dimensions};
/// let canvas = Dimensions::new(100, 100);
/// let logo = Dimensions::new(20, 10);
/// assert_eq!(placement_coordinates(canvas, logo, Anchor::BottomRight), (80, 90));
/// assert_eq!(placement_coordinates(canvas, logo, Anchor::MidCenter), (40, 45));
/// ```
pub fn placement_coordinates(
    container: Dimensions,
    overlay: Dimensions,
    anchor: Anchor,
) -> (i64, i64) {
    let free_x = container.width as i64 - overlay.width as i64;
    let free_y = container.height as i64 - overlay.height as i64;

    let x = match anchor {
        Anchor::TopLeft | Anchor::MidLeft | Anchor::BottomLeft => 0,
        Anchor::TopCenter | Anchor::MidCenter | Anchor::BottomCenter => free_x / 2,
        Anchor::TopRight | Anchor::MidRight | Anchor::BottomRight => free_x,
    };
    let y = match anchor {
        Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => 0,
        Anchor::MidLeft | Anchor::MidCenter | Anchor::MidRight => free_y / 2,
        Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => free_y,
    };
    (x, y)
}

/// Target size for a resize request.
///
/// - both axes 0: the source size, unchanged
/// - one axis 0: that axis follows the source aspect ratio
/// - `best_fit`: largest aspect-preserving size inside the box (may upscale)
/// - otherwise: exactly the requested box
pub fn resize_dimensions(source: Dimensions, requested: Dimensions, best_fit: bool) -> Dimensions {
    let (src_w, src_h) = (source.width as f64, source.height as f64);
    let (req_w, req_h) = (requested.width, requested.height);

    if source.width == 0 || source.height == 0 {
        return requested;
    }

    match (req_w, req_h) {
        (0, 0) => source,
        (0, h) => Dimensions::new(scale_axis(src_w, h as f64 / src_h), h),
        (w, 0) => Dimensions::new(w, scale_axis(src_h, w as f64 / src_w)),
        (w, h) if best_fit => {
            let ratio = (w as f64 / src_w).min(h as f64 / src_h);
            Dimensions::new(
                scale_axis(src_w, ratio).min(w),
                scale_axis(src_h, ratio).min(h),
            )
        }
        (w, h) => Dimensions::new(w, h),
    }
}

fn scale_axis(length: f64, ratio: f64) -> u32 {
    ((length * ratio).round() as u32).max(1)
}
