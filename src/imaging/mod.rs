//! Raster imaging: placement geometry, font fitting, alpha blending and
//! compositing over a pluggable engine.
//!
//! | Concern | Module |
//! |---|---|
//! | **Anchors / resize arithmetic** | [`geometry`] |
//! | **Font-size fitting** | [`text_fit`] |
//! | **Manual alpha attenuation** | [`alpha`] (rayon, row-parallel) |
//! | **Overlay resolution + composite** | [`compositor`] |
//! | **Engine primitives** | [`RasterEngine`] trait + [`ImageEngine`] |
//!
//! The module is split into:
//! - **Calculations**: pure functions for placement and dimension math (unit testable)
//! - **Parameters**: colors, fonts, filters, quality
//! - **Backend**: [`RasterEngine`] trait + [`ImageEngine`]
//! - **Policy**: fitting, attenuation and compositing on top of any engine

pub mod alpha;
pub mod backend;
pub mod compositor;
pub mod geometry;
mod params;
pub mod rust_backend;
pub mod text_fit;

pub use alpha::attenuate_opacity;
pub use backend::{
    Dimensions, EncodeOptions, EngineError, ImageInfo, PixelBuffer, RasterEngine, RasterSource,
    TextMetrics,
};
pub use compositor::{CompositeOptions, OverlaySource, RasterHandle};
pub use geometry::{Anchor, placement_coordinates, resize_dimensions};
pub use params::{Color, FontSpec, ParseColorError, Quality, ResizeFilter, TextAlign};
pub use rust_backend::ImageEngine;
pub use text_fit::fit_font_size;
