//! Shared test utilities for the placard test suite.
//!
//! Synthetic rasters and on-disk fixtures, so tests never depend on checked-in
//! binary files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("in.png");
//! create_test_png(&path, 200, 150);
//! ```

use image::{Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Rasters
// =========================================================================

/// Deterministic opaque gradient; every pixel differs from its neighbours.
pub fn pattern(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

// =========================================================================
// Files
// =========================================================================

/// Write a PNG of the given size to `path`.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    pattern(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a JPEG of the given size to `path`, regardless of its extension.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let rgb = image::DynamicImage::ImageRgba8(pattern(width, height)).into_rgb8();
    rgb.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}
