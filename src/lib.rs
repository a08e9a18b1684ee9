//! # Placard
//!
//! Put text and images exactly where you want them on a raster.
//!
//! Placard is a thin facade over a raster engine. The engine does the pixel
//! work (decode, resize, composite, draw glyphs, encode); placard adds the three
//! pieces of policy an engine doesn't:
//!
//! - **Anchored placement**: nine anchors (`top-left` … `bottom-right`) turned
//!   into top-left offsets for any overlay inside any container.
//! - **Font fitting**: find the font size at which a string first becomes wider
//!   than a target width.
//! - **Manual alpha attenuation**: fade an overlay by subtracting from its alpha
//!   channel before compositing, so semi-transparent watermarks work on
//!   transparent canvases too.
//!
//! ```text
//!        Image (facade)
//!     ┌──────┼───────────┬────────────┐
//!  geometry  text_fit  compositor ── alpha
//!     └──────┴───────────┴────────────┘
//!              RasterEngine (trait)
//!                     │
//!              ImageEngine (image + ab_glyph)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`facade`] | [`Image`](facade::Image): raster plus width/height/format bookkeeping |
//! | [`imaging`] | Engine trait, production engine, placement, fitting, blending |
//! | [`config`] | `placard.toml` loading and validation |
//! | [`error`] | [`ImageError`](error::ImageError) surfaced by the facade |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Engine Behind a Trait
//!
//! All policy code is generic over [`RasterEngine`](imaging::RasterEngine). Tests
//! drive it with a recording mock, so placement, fitting and blending are
//! checked without decoding a single file. The production
//! [`ImageEngine`](imaging::ImageEngine) is pure Rust: no ImageMagick, no system
//! libraries.
//!
//! ## Overshoot-by-One Fitting
//!
//! Fitting returns the first size whose width *exceeds* the target, never the
//! last one that fits. Layouts built on that behavior stay pixel-stable.
//!
//! ## Borrowed Overlays
//!
//! One image can be composited onto another by reference. The overlay's raster
//! is only copied when it has to be resized or faded, and the borrow checker
//! rules out compositing an image onto itself.
//!
//! ## Trusting Crop
//!
//! Resize, thumbnail and rotate read the new size back from the engine. Crop
//! records the size the caller asked for, even when the engine clamps the region.

pub mod config;
pub mod error;
pub mod facade;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
