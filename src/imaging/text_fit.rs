//! Font-size fitting.
//!
//! The fitted size is the **first** size whose measured width exceeds the
//! target, not the last one that fits. Callers that need "fits within" must
//! allow for that one-step overshoot.
//!
//! Two searches share that contract:
//! - [`fit_font_size_linear`] walks sizes 0, 1, 2, ... and is the reference.
//! - [`fit_font_size`] gallops to an upper bound, then bisects. It issues
//!   O(log n) metric calls and returns the same size whenever measured width
//!   is non-decreasing in font size.

use super::backend::{EngineError, RasterEngine};
use super::params::FontSpec;
use thiserror::Error;
use tracing::debug;

/// Default ceiling for the search; fonts rarely make sense beyond this.
pub const DEFAULT_MAX_FONT_SIZE: u32 = 4096;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("text {text:?} stays within {target_width}px up to font size {max_size}")]
    Unfittable {
        text: String,
        target_width: i64,
        max_size: u32,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn measured_width<E: RasterEngine + ?Sized>(
    engine: &E,
    font: &FontSpec,
    text: &str,
    size: u32,
) -> Result<i64, EngineError> {
    Ok(engine.measure_text(&font.with_size(size), text)?.width as i64)
}

fn unfittable(text: &str, target_width: i64, max_size: u32) -> FitError {
    FitError::Unfittable {
        text: text.to_string(),
        target_width,
        max_size,
    }
}

/// Reference linear search.
///
/// Every width is at least 0, so a negative target never measures anything
/// and returns size 0. Sizes up to and including `max_size` are tried.
pub fn fit_font_size_linear<E: RasterEngine + ?Sized>(
    engine: &E,
    text: &str,
    font: FontSpec,
    target_width: i64,
    max_size: u32,
) -> Result<FontSpec, FitError> {
    if target_width < 0 {
        return Ok(font.with_size(0));
    }
    for size in 0..=max_size {
        if measured_width(engine, &font, text, size)? > target_width {
            return Ok(font.with_size(size));
        }
    }
    Err(unfittable(text, target_width, max_size))
}

/// Galloping + binary search with the same result as [`fit_font_size_linear`].
pub fn fit_font_size<E: RasterEngine + ?Sized>(
    engine: &E,
    text: &str,
    font: FontSpec,
    target_width: i64,
    max_size: u32,
) -> Result<FontSpec, FitError> {
    if target_width < 0 {
        return Ok(font.with_size(0));
    }

    let exceeds = |size: u32| -> Result<bool, EngineError> {
        Ok(measured_width(engine, &font, text, size)? > target_width)
    };

    if exceeds(0)? {
        return Ok(font.with_size(0));
    }

    // Invariant: `low` fits (width <= target), `high` exceeds.
    let mut low = 0u32;
    let mut probe = 1u32;
    let high = loop {
        if probe >= max_size {
            if exceeds(max_size)? {
                break max_size;
            }
            return Err(unfittable(text, target_width, max_size));
        }
        if exceeds(probe)? {
            break probe;
        }
        low = probe;
        probe = probe.saturating_mul(2);
    };

    let mut high = high;
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if exceeds(mid)? {
            high = mid;
        } else {
            low = mid;
        }
    }

    debug!(text, target_width, size = high, "fitted font size");
    Ok(font.with_size(high))
}
