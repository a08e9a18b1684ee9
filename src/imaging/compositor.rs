//! Overlay compositing.
//!
//! An overlay is resolved once from an [`OverlaySource`], optionally resized,
//! optionally alpha-attenuated, and finally handed to the engine's
//! composite-over primitive.
//!
//! Sources borrowed from another image are never copied unless a resize or
//! attenuation has to modify them; the source image itself is never mutated.

use super::alpha::attenuate_opacity;
use super::backend::{Dimensions, PixelBuffer, RasterEngine, RasterSource};
use super::geometry::{Anchor, placement_coordinates, resize_dimensions};
use super::params::ResizeFilter;
use crate::error::ImageError;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

/// Transparency `place_image` uses when the caller has no preference.
///
/// At 100% the attenuation pass is skipped entirely, so by default placed
/// overlays keep their own alpha. `composite_image` defaults to 0.
pub const DEFAULT_PLACE_TRANSPARENCY: u32 = 100;

/// Anything that can lend out an engine raster for the duration of a call.
pub trait RasterHandle<E: RasterEngine + ?Sized> {
    /// `None` when there is nothing to lend (e.g. a blank image).
    fn raster(&self) -> Option<&E::Raster>;
}

/// Where an overlay's pixels come from.
pub enum OverlaySource<'a, E: RasterEngine + ?Sized> {
    /// An encoded file on disk.
    Path(&'a Path),
    /// Encoded bytes in memory.
    Bytes(&'a [u8]),
    /// Another image's raster, borrowed without copying.
    Handle(&'a dyn RasterHandle<E>),
}

impl<E: RasterEngine + ?Sized> Clone for OverlaySource<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: RasterEngine + ?Sized> Copy for OverlaySource<'_, E> {}

impl<E: RasterEngine + ?Sized> std::fmt::Debug for OverlaySource<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

impl<'a, E: RasterEngine + ?Sized> From<&'a Path> for OverlaySource<'a, E> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a, E: RasterEngine + ?Sized> From<&'a [u8]> for OverlaySource<'a, E> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

/// How an overlay is prepared before compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Resize the overlay (best fit) before compositing.
    pub target_size: Option<Dimensions>,
    /// 0..=100; values of 100 or more leave the overlay's alpha untouched.
    pub transparency_percent: u32,
    pub filter: ResizeFilter,
}

impl CompositeOptions {
    /// Build from the facade's `width`/`height` convention where `0, 0` means
    /// "native size".
    pub fn new(width: u32, height: u32, transparency_percent: u32, filter: ResizeFilter) -> Self {
        let target_size = (width > 0 || height > 0).then_some(Dimensions::new(width, height));
        Self {
            target_size,
            transparency_percent,
            filter,
        }
    }
}

/// Decode or borrow the overlay's raster.
pub fn resolve_overlay<'s, E: RasterEngine + ?Sized>(
    engine: &E,
    source: OverlaySource<'s, E>,
) -> Result<Cow<'s, E::Raster>, ImageError> {
    match source {
        OverlaySource::Path(path) => Ok(Cow::Owned(engine.decode(RasterSource::Path(path))?)),
        OverlaySource::Bytes(bytes) => {
            Ok(Cow::Owned(engine.decode(RasterSource::Bytes(bytes))?))
        }
        OverlaySource::Handle(handle) => handle.raster().map(Cow::Borrowed).ok_or_else(|| {
            ImageError::UnsupportedOperand("overlay image has no raster to borrow".to_string())
        }),
    }
}

/// Resize and attenuate a resolved overlay, then composite it at (x, y).
pub fn composite_resolved<E: RasterEngine + ?Sized>(
    engine: &E,
    canvas: &mut E::Raster,
    mut overlay: Cow<'_, E::Raster>,
    x: i64,
    y: i64,
    options: &CompositeOptions,
) -> Result<(), ImageError> {
    if let Some(size) = options.target_size {
        engine.resize(overlay.to_mut(), size, options.filter, true)?;
    }
    // 100% and above is a no-op for the blender; skip it so borrowed overlays stay uncopied.
    if (1..100).contains(&options.transparency_percent) {
        attenuate_opacity(overlay.to_mut(), options.transparency_percent);
    }

    debug!(
        x,
        y,
        copied = matches!(overlay, Cow::Owned(_)),
        transparency = options.transparency_percent,
        "compositing overlay"
    );
    engine.composite_over(canvas, &overlay, x, y)?;
    Ok(())
}

/// Composite `source` onto `canvas` with its top-left at (x, y).
pub fn composite_image<E: RasterEngine + ?Sized>(
    engine: &E,
    canvas: &mut E::Raster,
    source: OverlaySource<'_, E>,
    x: i64,
    y: i64,
    options: &CompositeOptions,
) -> Result<(), ImageError> {
    let overlay = resolve_overlay(engine, source)?;
    composite_resolved(engine, canvas, overlay, x, y, options)
}

/// Composite `source` at `anchor` inside a container of size `container`.
///
/// The overlay size used for placement is the requested target size. A zero
/// axis is derived from the overlay's aspect ratio, the same way the resize
/// derives it. Returns the coordinates used.
pub fn place_image<E: RasterEngine + ?Sized>(
    engine: &E,
    canvas: &mut E::Raster,
    container: Dimensions,
    source: OverlaySource<'_, E>,
    anchor: Anchor,
    options: &CompositeOptions,
) -> Result<(i64, i64), ImageError> {
    let overlay = resolve_overlay(engine, source)?;
    let native = overlay.geometry();
    let placed_size = match options.target_size {
        Some(size) if size.width == 0 || size.height == 0 => {
            resize_dimensions(native, size, true)
        }
        Some(size) => size,
        None => native,
    };

    let (x, y) = placement_coordinates(container, placed_size, anchor);
    composite_resolved(engine, canvas, overlay, x, y, options)?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockEngine, RecordedOp};
    use image::{Rgba, RgbaImage};

    struct Lender(Option<RgbaImage>);

    impl RasterHandle<MockEngine> for Lender {
        fn raster(&self) -> Option<&RgbaImage> {
            self.0.as_ref()
        }
    }

    fn opaque(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]))
    }

    fn composites(engine: &MockEngine) -> Vec<RecordedOp> {
        engine
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Composite { .. }))
            .collect()
    }

    #[test]
    fn options_zero_size_means_native() {
        let opts = CompositeOptions::new(0, 0, 0, ResizeFilter::Nearest);
        assert_eq!(opts.target_size, None);
        let opts = CompositeOptions::new(10, 0, 0, ResizeFilter::Nearest);
        assert_eq!(opts.target_size, Some(Dimensions::new(10, 0)));
    }

    #[test]
    fn path_source_is_decoded() {
        let engine = MockEngine::with_decoded(vec![opaque(4, 4)]);
        let mut canvas = RgbaImage::new(10, 10);
        composite_image(
            &engine,
            &mut canvas,
            OverlaySource::Path(Path::new("/logo.png")),
            3,
            4,
            &CompositeOptions::new(0, 0, 0, ResizeFilter::Nearest),
        )
        .unwrap();

        let ops = engine.get_operations();
        assert_eq!(ops[0], RecordedOp::Decode("/logo.png".into()));
        assert!(matches!(&ops[1], RecordedOp::Composite { x: 3, y: 4, .. }));
        assert_eq!(canvas.get_pixel(3, 4), &Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn bytes_source_is_decoded() {
        let engine = MockEngine::with_decoded(vec![opaque(2, 2)]);
        let mut canvas = RgbaImage::new(4, 4);
        let bytes = [1u8, 2, 3];
        composite_image(
            &engine,
            &mut canvas,
            OverlaySource::from(&bytes[..]),
            0,
            0,
            &CompositeOptions::new(0, 0, 0, ResizeFilter::Nearest),
        )
        .unwrap();
        assert_eq!(engine.get_operations()[0], RecordedOp::Decode("<3 bytes>".into()));
    }

    #[test]
    fn blank_handle_is_unsupported_operand() {
        let engine = MockEngine::new();
        let mut canvas = RgbaImage::new(4, 4);
        let lender = Lender(None);
        let result = composite_image(
            &engine,
            &mut canvas,
            OverlaySource::Handle(&lender),
            0,
            0,
            &CompositeOptions::new(0, 0, 0, ResizeFilter::Nearest),
        );
        assert!(matches!(result, Err(ImageError::UnsupportedOperand(_))));
        assert!(composites(&engine).is_empty());
    }

    #[test]
    fn borrowed_overlay_is_left_untouched() {
        let engine = MockEngine::new();
        let mut canvas = RgbaImage::new(20, 20);
        let lender = Lender(Some(opaque(5, 5)));
        composite_image(
            &engine,
            &mut canvas,
            OverlaySource::Handle(&lender),
            0,
            0,
            &CompositeOptions::new(10, 10, 50, ResizeFilter::Nearest),
        )
        .unwrap();

        // Source still 5x5 and opaque; the composite got the resized, attenuated copy
        assert_eq!(lender.0.as_ref().unwrap(), &opaque(5, 5));
        match &composites(&engine)[0] {
            RecordedOp::Composite { overlay, alphas, .. } => {
                assert_eq!(*overlay, Dimensions::new(10, 10));
                assert!(alphas.iter().all(|&a| a == 127 || a == 128));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resize_uses_best_fit_and_configured_filter() {
        let engine = MockEngine::with_decoded(vec![opaque(40, 20)]);
        let mut canvas = RgbaImage::new(100, 100);
        composite_image(
            &engine,
            &mut canvas,
            OverlaySource::Path(Path::new("/wide.png")),
            0,
            0,
            &CompositeOptions::new(10, 10, 0, ResizeFilter::Gaussian),
        )
        .unwrap();
        assert!(engine.get_operations().contains(&RecordedOp::Resize {
            width: 10,
            height: 10,
            filter: ResizeFilter::Gaussian,
            best_fit: true,
        }));
    }

    #[test]
    fn full_transparency_keeps_overlay_alpha() {
        let engine = MockEngine::with_decoded(vec![opaque(3, 3)]);
        let mut canvas = RgbaImage::new(10, 10);
        composite_image(
            &engine,
            &mut canvas,
            OverlaySource::Path(Path::new("/a.png")),
            0,
            0,
            &CompositeOptions::new(0, 0, 100, ResizeFilter::Nearest),
        )
        .unwrap();
        match &composites(&engine)[0] {
            RecordedOp::Composite { alphas, .. } => assert!(alphas.iter().all(|&a| a == 255)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn place_uses_target_size_for_coordinates() {
        // Native 40x20, best-fit into 20x20 gives 20x10, but placement uses 20x20
        let engine = MockEngine::with_decoded(vec![opaque(40, 20)]);
        let mut canvas = RgbaImage::new(100, 100);
        let xy = place_image(
            &engine,
            &mut canvas,
            Dimensions::new(100, 100),
            OverlaySource::Path(Path::new("/wide.png")),
            Anchor::BottomRight,
            &CompositeOptions::new(20, 20, 0, ResizeFilter::Nearest),
        )
        .unwrap();
        assert_eq!(xy, (80, 80));
    }

    #[test]
    fn place_derives_zero_axis_from_aspect_ratio() {
        // 40x20 at width 30 resizes to 30x15, so the bottom edge stays flush
        let engine = MockEngine::with_decoded(vec![opaque(40, 20)]);
        let mut canvas = RgbaImage::new(100, 100);
        let xy = place_image(
            &engine,
            &mut canvas,
            Dimensions::new(100, 100),
            OverlaySource::Path(Path::new("/wide.png")),
            Anchor::BottomRight,
            &CompositeOptions::new(30, 0, 0, ResizeFilter::Nearest),
        )
        .unwrap();
        assert_eq!(xy, (70, 85));
    }

    #[test]
    fn place_derives_zero_width_from_aspect_ratio() {
        let engine = MockEngine::with_decoded(vec![opaque(40, 20)]);
        let mut canvas = RgbaImage::new(100, 100);
        let xy = place_image(
            &engine,
            &mut canvas,
            Dimensions::new(100, 100),
            OverlaySource::Path(Path::new("/wide.png")),
            Anchor::BottomRight,
            &CompositeOptions::new(0, 10, 0, ResizeFilter::Nearest),
        )
        .unwrap();
        assert_eq!(xy, (80, 90));
    }

    #[test]
    fn place_uses_native_size_without_target() {
        let engine = MockEngine::with_decoded(vec![opaque(30, 10)]);
        let mut canvas = RgbaImage::new(100, 100);
        let xy = place_image(
            &engine,
            &mut canvas,
            Dimensions::new(100, 100),
            OverlaySource::Path(Path::new("/a.png")),
            Anchor::MidCenter,
            &CompositeOptions::new(0, 0, DEFAULT_PLACE_TRANSPARENCY, ResizeFilter::Nearest),
        )
        .unwrap();
        assert_eq!(xy, (35, 45));
        assert_eq!(
            engine.count(|op| matches!(op, RecordedOp::Decode(_))),
            1,
            "source resolved once"
        );
    }
}
