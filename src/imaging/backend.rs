//! Raster engine trait and shared types.
//!
//! The [`RasterEngine`] trait lists the primitives the facade consumes: canvas
//! creation, identify/decode, resize, thumbnail, crop, rotate, composite-over,
//! text metrics and drawing, and encoding. Pixel-level access goes through the
//! [`PixelBuffer`] bound on the engine's raster type.
//!
//! The production implementation is
//! [`ImageEngine`](super::rust_backend::ImageEngine), built on the `image` and
//! `ab_glyph` crates. Placement, fitting and blending policy never lives in an
//! engine; engines only execute primitives.

use super::params::{Color, FontSpec, Quality, ResizeFilter};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// What an identify call learns from file metadata, without decoding pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub dimensions: Dimensions,
    /// Canonical lowercase extension, e.g. `"png"`, `"jpg"`.
    pub format: Option<String>,
    pub mime: Option<String>,
}

/// Rendered extent of a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
}

impl TextMetrics {
    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Where an engine should decode a raster from.
#[derive(Debug, Clone, Copy)]
pub enum RasterSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Encoding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Format name such as `"png"` or `"jpg"`; engines reject names they don't know.
    pub format: String,
    /// JPEG compression quality. `None` leaves the engine default.
    pub jpeg_quality: Option<Quality>,
}

/// Row-major RGBA8 pixel storage with writable samples.
pub trait PixelBuffer {
    fn geometry(&self) -> Dimensions;

    /// All samples, four per pixel (`r, g, b, a`), rows top to bottom.
    fn samples_mut(&mut self) -> &mut [u8];
}

impl PixelBuffer for RgbaImage {
    fn geometry(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    fn samples_mut(&mut self) -> &mut [u8] {
        &mut **self
    }
}

/// Primitive operations of a raster engine.
///
/// Operations that change geometry report the raster's new dimensions so the
/// caller can decide whether to trust them.
pub trait RasterEngine {
    type Raster: PixelBuffer + Clone + 'static;

    /// Allocate a blank canvas filled with `background`.
    fn create_canvas(
        &self,
        size: Dimensions,
        background: Color,
    ) -> Result<Self::Raster, EngineError>;

    /// Probe dimensions and format from file metadata.
    fn identify(&self, path: &Path) -> Result<ImageInfo, EngineError>;

    fn decode(&self, source: RasterSource<'_>) -> Result<Self::Raster, EngineError>;

    fn resize(
        &self,
        raster: &mut Self::Raster,
        size: Dimensions,
        filter: ResizeFilter,
        best_fit: bool,
    ) -> Result<Dimensions, EngineError>;

    /// Shrink for display. `fill` covers the box and center-crops; otherwise
    /// the result fits inside the box.
    fn thumbnail(
        &self,
        raster: &mut Self::Raster,
        size: Dimensions,
        filter: ResizeFilter,
        fill: bool,
    ) -> Result<Dimensions, EngineError>;

    fn crop(
        &self,
        raster: &mut Self::Raster,
        size: Dimensions,
        x: u32,
        y: u32,
    ) -> Result<Dimensions, EngineError>;

    /// Rotate clockwise by `degrees`, filling uncovered corners with `fill`.
    fn rotate(
        &self,
        raster: &mut Self::Raster,
        degrees: f64,
        fill: Color,
    ) -> Result<Dimensions, EngineError>;

    /// Alpha-composite `overlay` over `canvas` with its top-left at (x, y).
    fn composite_over(
        &self,
        canvas: &mut Self::Raster,
        overlay: &Self::Raster,
        x: i64,
        y: i64,
    ) -> Result<(), EngineError>;

    fn measure_text(&self, font: &FontSpec, text: &str) -> Result<TextMetrics, EngineError>;

    /// Draw `text` with the top-left of its bounding box at (x, y), rotated
    /// clockwise by `angle` degrees around that box's center.
    fn draw_text(
        &self,
        raster: &mut Self::Raster,
        font: &FontSpec,
        text: &str,
        x: i64,
        y: i64,
        angle: f64,
    ) -> Result<(), EngineError>;

    fn encode(&self, raster: &Self::Raster, options: &EncodeOptions)
    -> Result<Vec<u8>, EngineError>;
}
