//! Manual opacity reduction for overlays.
//!
//! Compositing a semi-transparent overlay onto a transparent canvas cannot be
//! expressed through the composite primitive alone, so the overlay's alpha
//! channel is attenuated here before it is handed to the engine.
//!
//! The attenuation is subtractive: each pixel's normalized alpha `a` becomes
//! `max(a - t, 0)` where `t = percent / 100`. At 50% an opaque pixel becomes
//! half transparent while a half-transparent one disappears entirely.

use super::backend::PixelBuffer;
use rayon::prelude::*;
use tracing::trace;

const CHANNELS: usize = 4;

/// Subtract `transparency_percent / 100` from every pixel's alpha, in place.
///
/// At 100% or more this is a no-op: the buffer is left exactly as it was and
/// no pixel is visited.
pub fn attenuate_opacity<B: PixelBuffer + ?Sized>(buffer: &mut B, transparency_percent: u32) {
    let transparency = transparency_percent as f32 / 100.0;
    if transparency >= 1.0 {
        return;
    }

    let dims = buffer.geometry();
    let row_len = dims.width as usize * CHANNELS;
    if row_len == 0 {
        return;
    }

    buffer
        .samples_mut()
        .par_chunks_mut(row_len)
        .for_each(|row| {
            for pixel in row.chunks_exact_mut(CHANNELS) {
                pixel[3] = attenuate_sample(pixel[3], transparency);
            }
        });

    trace!(
        width = dims.width,
        height = dims.height,
        transparency_percent,
        "attenuated overlay alpha"
    );
}

/// `round(max(a/255 - t, 0) * 255)` for a single 8-bit alpha sample.
fn attenuate_sample(alpha: u8, transparency: f32) -> u8 {
    let normalized = alpha as f32 / 255.0;
    let reduced = (normalized - transparency).max(0.0);
    (reduced * 255.0).round() as u8
}
