//! The [`Image`] facade.
//!
//! An `Image` borrows a [`RasterEngine`] and owns at most one raster. It keeps
//! width, height, background, format and source path alongside the raster and
//! routes placement, font fitting and overlay compositing through the
//! [`imaging`](crate::imaging) policy modules before calling the engine.
//!
//! ```text
//! create_new / load ──► resize / crop / thumbnail / rotate
//!                        annotate_text / place_text
//!                        composite_image / place_image ──► output / write
//! ```
//!
//! Geometry-changing operations read the new size back from the engine, with one
//! exception: `crop` records the size that was asked for.

use crate::config::Config;
use crate::error::ImageError;
use crate::imaging::compositor::{self, CompositeOptions, OverlaySource, RasterHandle};
use crate::imaging::{
    Anchor, Color, Dimensions, EncodeOptions, FontSpec, ImageInfo, Quality, RasterEngine,
    RasterSource, ResizeFilter, fit_font_size, placement_coordinates,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Clockwise rotation applied when the caller has no angle in mind.
pub const DEFAULT_ROTATION: f64 = 90.0;

/// Everything the facade tracks about its raster besides the pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageState {
    pub width: u32,
    pub height: u32,
    /// Fill color of a canvas made by `create_new`; `None` for loaded images.
    pub background: Option<Color>,
    /// Output format name; unset until loaded, set, or passed to `output`.
    pub format: Option<String>,
    pub mime: Option<String>,
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct Settings {
    default_format: String,
    filter: ResizeFilter,
    max_fit_size: u32,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            default_format: config.output.default_format.clone(),
            filter: config.resize.filter,
            max_fit_size: config.text.max_fit_size,
        }
    }
}

/// A raster plus its bookkeeping, driven through a borrowed engine.
pub struct Image<'e, E: RasterEngine> {
    engine: &'e E,
    raster: Option<E::Raster>,
    state: ImageState,
    settings: Settings,
}

impl<'e, E: RasterEngine> Image<'e, E> {
    /// A blank image using the stock configuration.
    pub fn new(engine: &'e E) -> Self {
        Self::with_config(engine, &Config::default())
    }

    pub fn with_config(engine: &'e E, config: &Config) -> Self {
        Self {
            engine,
            raster: None,
            state: ImageState::default(),
            settings: Settings::from(config),
        }
    }

    /// Probe a file's dimensions, format and mime type without decoding it.
    pub fn info(engine: &E, path: impl AsRef<Path>) -> Result<ImageInfo, ImageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImageError::ImageNotFound(path.to_path_buf()));
        }
        Ok(engine.identify(path)?)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replace the current raster with a `width × height` canvas of `background`.
    pub fn create_new(
        &mut self,
        width: u32,
        height: u32,
        background: Color,
    ) -> Result<(), ImageError> {
        let canvas = self
            .engine
            .create_canvas(Dimensions::new(width, height), background)?;
        self.raster = Some(canvas);
        self.state = ImageState {
            width,
            height,
            background: Some(background),
            ..ImageState::default()
        };
        Ok(())
    }

    /// Decode `path` into this image.
    ///
    /// Width, height, format and mime come from the file's metadata, which is
    /// read before the pixels are decoded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImageError::ImageNotFound(path.to_path_buf()));
        }

        let info = self.engine.identify(path)?;
        let raster = self.engine.decode(RasterSource::Path(path))?;
        debug!(
            path = %path.display(),
            width = info.dimensions.width,
            height = info.dimensions.height,
            format = ?info.format,
            "loaded image"
        );

        self.raster = Some(raster);
        self.state = ImageState {
            width: info.dimensions.width,
            height: info.dimensions.height,
            background: None,
            format: info.format,
            mime: info.mime,
            source_path: Some(path.to_path_buf()),
        };
        Ok(())
    }

    fn raster_mut(&mut self) -> Result<&mut E::Raster, ImageError> {
        if self.is_blank() {
            return Err(ImageError::EmptyImage);
        }
        self.raster.as_mut().ok_or(ImageError::EmptyImage)
    }

    fn sync(&mut self, dims: Dimensions) -> Dimensions {
        self.state.width = dims.width;
        self.state.height = dims.height;
        dims
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Resize to `width × height`; best fit keeps the aspect ratio inside the box.
    ///
    /// A zero axis is derived from the other one. Returns the new size as
    /// reported by the engine.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        best_fit: bool,
    ) -> Result<Dimensions, ImageError> {
        let (engine, filter) = (self.engine, self.settings.filter);
        let raster = self.raster_mut()?;
        let dims = engine.resize(raster, Dimensions::new(width, height), filter, best_fit)?;
        Ok(self.sync(dims))
    }

    /// Cut out `width × height` starting at (x, y).
    ///
    /// The recorded size is the requested one even if the engine clamps the
    /// region to the raster's bounds.
    pub fn crop(&mut self, width: u32, height: u32, x: u32, y: u32) -> Result<(), ImageError> {
        let engine = self.engine;
        let raster = self.raster_mut()?;
        engine.crop(raster, Dimensions::new(width, height), x, y)?;
        self.state.width = width;
        self.state.height = height;
        Ok(())
    }

    /// Shrink for display. `crop` fills the box and trims the overflow.
    pub fn thumbnail(
        &mut self,
        width: u32,
        height: u32,
        crop: bool,
    ) -> Result<Dimensions, ImageError> {
        let (engine, filter) = (self.engine, self.settings.filter);
        let raster = self.raster_mut()?;
        let dims = engine.thumbnail(raster, Dimensions::new(width, height), filter, crop)?;
        Ok(self.sync(dims))
    }

    /// Rotate clockwise, filling uncovered corners with `background`.
    pub fn rotate(&mut self, degrees: f64, background: Color) -> Result<Dimensions, ImageError> {
        let engine = self.engine;
        let raster = self.raster_mut()?;
        let dims = engine.rotate(raster, degrees, background)?;
        Ok(self.sync(dims))
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Draw `text` with its bounding box's top-left corner at (x, y).
    pub fn annotate_text(
        &mut self,
        text: &str,
        x: i64,
        y: i64,
        angle: f64,
        font: &FontSpec,
    ) -> Result<(), ImageError> {
        let engine = self.engine;
        let raster = self.raster_mut()?;
        engine.draw_text(raster, font, text, x, y, angle)?;
        Ok(())
    }

    /// Draw `text` at `anchor`, optionally fitting the font to `fit_width` first.
    ///
    /// With `fit_width > 0` the font size becomes the first size whose rendered
    /// width exceeds `fit_width` (see [`text_fit`](crate::imaging::text_fit)).
    /// Returns the font that was drawn with.
    pub fn place_text(
        &mut self,
        text: &str,
        anchor: Anchor,
        font: FontSpec,
        fit_width: i64,
    ) -> Result<FontSpec, ImageError> {
        if self.is_blank() {
            return Err(ImageError::EmptyImage);
        }

        let font = if fit_width > 0 {
            fit_font_size(
                self.engine,
                text,
                font,
                fit_width,
                self.settings.max_fit_size,
            )?
        } else {
            font
        };

        let metrics = self.engine.measure_text(&font, text)?;
        let (x, y) = placement_coordinates(self.dimensions(), metrics.dimensions(), anchor);
        debug!(text, %anchor, x, y, size = font.size, "placing text");
        self.annotate_text(text, x, y, 0.0, &font)?;
        Ok(font)
    }

    // =========================================================================
    // Compositing
    // =========================================================================

    /// Composite `source` with its top-left at (x, y).
    ///
    /// Non-zero `width`/`height` resize the overlay (best fit) first;
    /// `transparency_percent` in 1..100 fades it before compositing.
    pub fn composite_image(
        &mut self,
        source: OverlaySource<'_, E>,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        transparency_percent: u32,
    ) -> Result<(), ImageError> {
        let options =
            CompositeOptions::new(width, height, transparency_percent, self.settings.filter);
        let engine = self.engine;
        let canvas = self.raster_mut()?;
        compositor::composite_image(engine, canvas, source, x, y, &options)
    }

    /// Composite `source` at `anchor` and return the coordinates used.
    ///
    /// Callers without a transparency preference pass
    /// [`DEFAULT_PLACE_TRANSPARENCY`](compositor::DEFAULT_PLACE_TRANSPARENCY),
    /// which leaves the overlay's own alpha as is.
    pub fn place_image(
        &mut self,
        source: OverlaySource<'_, E>,
        anchor: Anchor,
        width: u32,
        height: u32,
        transparency_percent: u32,
    ) -> Result<(i64, i64), ImageError> {
        let options =
            CompositeOptions::new(width, height, transparency_percent, self.settings.filter);
        let container = self.dimensions();
        let engine = self.engine;
        let canvas = self.raster_mut()?;
        compositor::place_image(engine, canvas, container, source, anchor, &options)
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Encode to bytes.
    ///
    /// `Some(format)` is used and remembered as this image's format; otherwise
    /// the image's own format, then the configured default.
    pub fn output(&mut self, format: Option<&str>) -> Result<Vec<u8>, ImageError> {
        let Some(requested) = format.map(str::to_ascii_lowercase) else {
            let format = self
                .state
                .format
                .clone()
                .unwrap_or_else(|| self.settings.default_format.clone());
            return self.encode(format, None);
        };
        let bytes = self.encode(requested.clone(), None)?;
        self.state.format = Some(requested);
        Ok(bytes)
    }

    /// Encode and write to `path`.
    ///
    /// The format is this image's format, else `path`'s extension, else the
    /// configured default. `jpeg_quality` of 0 keeps the engine default.
    pub fn write(&mut self, path: impl AsRef<Path>, jpeg_quality: u32) -> Result<(), ImageError> {
        let path = path.as_ref();
        let format = self
            .state
            .format
            .clone()
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase)
            })
            .unwrap_or_else(|| self.settings.default_format.clone());

        let bytes = self.encode(format, Quality::from_optional(jpeg_quality))?;
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote image");
        Ok(())
    }

    fn encode(
        &mut self,
        format: String,
        jpeg_quality: Option<Quality>,
    ) -> Result<Vec<u8>, ImageError> {
        let engine = self.engine;
        let raster = self.raster_mut()?;
        Ok(engine.encode(raster, &EncodeOptions { format, jpeg_quality })?)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_blank(&self) -> bool {
        self.state.width == 0
    }

    pub fn width(&self) -> u32 {
        self.state.width
    }

    pub fn height(&self) -> u32 {
        self.state.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.state.width, self.state.height)
    }

    pub fn format(&self) -> Option<&str> {
        self.state.format.as_deref()
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.state.format = Some(format.into().to_ascii_lowercase());
    }

    pub fn background(&self) -> Option<Color> {
        self.state.background
    }

    pub fn mime(&self) -> Option<&str> {
        self.state.mime.as_deref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.state.source_path.as_deref()
    }

    pub fn state(&self) -> &ImageState {
        &self.state
    }

    /// The engine raster, or `None` for a blank image.
    pub fn pixels(&self) -> Option<&E::Raster> {
        if self.is_blank() {
            return None;
        }
        self.raster.as_ref()
    }
}

impl<E: RasterEngine> RasterHandle<E> for Image<'_, E> {
    fn raster(&self) -> Option<&E::Raster> {
        self.pixels()
    }
}

impl<'a, E: RasterEngine> From<&'a Image<'_, E>> for OverlaySource<'a, E> {
    fn from(image: &'a Image<'_, E>) -> Self {
        OverlaySource::Handle(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockEngine, RecordedOp};
    use crate::imaging::compositor::DEFAULT_PLACE_TRANSPARENCY;
    use crate::test_helpers::pattern;
    use tempfile::TempDir;

    fn canvas(engine: &MockEngine, width: u32, height: u32) -> Image<'_, MockEngine> {
        let mut image = Image::new(engine);
        image.create_new(width, height, Color::TRANSPARENT).unwrap();
        image
    }

    fn png_info(width: u32, height: u32) -> ImageInfo {
        ImageInfo {
            dimensions: Dimensions::new(width, height),
            format: Some("png".into()),
            mime: Some("image/png".into()),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn new_image_is_blank() {
        let engine = MockEngine::new();
        let image = Image::new(&engine);
        assert!(image.is_blank());
        assert_eq!(image.format(), None);
        assert!(engine.get_operations().is_empty());
    }

    #[test]
    fn create_new_sets_state_without_format() {
        let engine = MockEngine::new();
        let image = canvas(&engine, 100, 50);
        assert!(!image.is_blank());
        assert_eq!(image.dimensions(), Dimensions::new(100, 50));
        assert_eq!(image.background(), Some(Color::TRANSPARENT));
        assert_eq!(image.format(), None);
        assert_eq!(image.source_path(), None);
    }

    #[test]
    fn zero_width_canvas_is_blank() {
        let engine = MockEngine::new();
        let image = canvas(&engine, 0, 10);
        assert!(image.is_blank());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let engine = MockEngine::new();
        let mut image = Image::new(&engine);
        let result = image.load("/nonexistent/photo.png");
        assert!(matches!(result, Err(ImageError::ImageNotFound(_))));
        assert!(engine.get_operations().is_empty());
    }

    #[test]
    fn load_takes_dimensions_from_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        fs::write(&path, b"stub").unwrap();

        // Metadata says 640x480 even though the decoded raster is 10x10
        let engine = MockEngine::with_identify(vec![png_info(640, 480)], vec![pattern(10, 10)]);
        let mut image = Image::new(&engine);
        image.load(&path).unwrap();

        assert_eq!(image.dimensions(), Dimensions::new(640, 480));
        assert_eq!(image.format(), Some("png"));
        assert_eq!(image.mime(), Some("image/png"));
        assert_eq!(image.source_path(), Some(path.as_path()));
        assert_eq!(image.background(), None);

        let ops = engine.get_operations();
        assert!(matches!(ops[0], RecordedOp::Identify(_)));
        assert!(matches!(ops[1], RecordedOp::Decode(_)));
    }

    #[test]
    fn info_probes_without_decoding() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        fs::write(&path, b"stub").unwrap();

        let engine = MockEngine::with_identify(vec![png_info(3, 4)], vec![]);
        let info = Image::info(&engine, &path).unwrap();
        assert_eq!(info.dimensions, Dimensions::new(3, 4));
        assert_eq!(engine.count(|op| matches!(op, RecordedOp::Decode(_))), 0);

        assert!(matches!(
            Image::info(&engine, tmp.path().join("missing.png")),
            Err(ImageError::ImageNotFound(_))
        ));
    }

    // =========================================================================
    // Geometry bookkeeping
    // =========================================================================

    #[test]
    fn blank_image_rejects_mutation() {
        let engine = MockEngine::new();
        let mut image = Image::new(&engine);
        let font = FontSpec::new("/f.ttf", 10);

        assert!(matches!(image.resize(10, 10, true), Err(ImageError::EmptyImage)));
        assert!(matches!(image.crop(1, 1, 0, 0), Err(ImageError::EmptyImage)));
        assert!(matches!(image.thumbnail(5, 5, false), Err(ImageError::EmptyImage)));
        assert!(matches!(
            image.rotate(DEFAULT_ROTATION, Color::TRANSPARENT),
            Err(ImageError::EmptyImage)
        ));
        assert!(matches!(
            image.annotate_text("x", 0, 0, 0.0, &font),
            Err(ImageError::EmptyImage)
        ));
        assert!(matches!(
            image.place_text("x", Anchor::TopLeft, font, 0),
            Err(ImageError::EmptyImage)
        ));
        assert!(matches!(image.output(None), Err(ImageError::EmptyImage)));
        assert!(matches!(image.write("/tmp/x.png", 0), Err(ImageError::EmptyImage)));
        assert!(engine.get_operations().is_empty());
    }

    #[test]
    fn blank_image_lends_no_pixels() {
        let engine = MockEngine::new();
        let mut image = Image::new(&engine);
        image.create_new(0, 10, Color::WHITE).unwrap();
        assert!(image.is_blank());
        assert!(image.pixels().is_none());
        assert!(RasterHandle::raster(&image).is_none());

        let image = canvas(&engine, 4, 4);
        assert!(image.pixels().is_some());
        assert!(RasterHandle::raster(&image).is_some());
    }

    #[test]
    fn crop_trusts_requested_size() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 100);
        engine.report_geometry(Dimensions::new(1, 1));

        image.crop(30, 40, 5, 5).unwrap();
        assert_eq!(image.dimensions(), Dimensions::new(30, 40));
        assert!(engine.get_operations().contains(&RecordedOp::Crop {
            width: 30,
            height: 40,
            x: 5,
            y: 5,
        }));
    }

    #[test]
    fn resize_resyncs_from_engine() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 100);
        engine.report_geometry(Dimensions::new(7, 9));

        let dims = image.resize(50, 50, true).unwrap();
        assert_eq!(dims, Dimensions::new(7, 9));
        assert_eq!(image.dimensions(), Dimensions::new(7, 9));
    }

    #[test]
    fn resize_uses_configured_filter() {
        let engine = MockEngine::new();
        let mut config = Config::default();
        config.resize.filter = ResizeFilter::CatmullRom;
        let mut image = Image::with_config(&engine, &config);
        image.create_new(80, 40, Color::WHITE).unwrap();

        let dims = image.resize(20, 20, true).unwrap();
        assert_eq!(dims, Dimensions::new(20, 10));
        assert!(engine.get_operations().contains(&RecordedOp::Resize {
            width: 20,
            height: 20,
            filter: ResizeFilter::CatmullRom,
            best_fit: true,
        }));
    }

    #[test]
    fn thumbnail_and_rotate_resync() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 50);

        image.rotate(DEFAULT_ROTATION, Color::TRANSPARENT).unwrap();
        assert_eq!(image.dimensions(), Dimensions::new(50, 100));

        image.thumbnail(20, 20, true).unwrap();
        assert_eq!(image.dimensions(), Dimensions::new(20, 20));
        assert!(engine.get_operations().contains(&RecordedOp::Thumbnail {
            width: 20,
            height: 20,
            fill: true,
        }));
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[test]
    fn annotate_draws_at_given_origin() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 100);
        image
            .annotate_text("Hi", 3, -4, 45.0, &FontSpec::new("/f.ttf", 10))
            .unwrap();
        assert!(engine.get_operations().contains(&RecordedOp::DrawText {
            text: "Hi".into(),
            x: 3,
            y: -4,
            angle: 45.0,
            size: 10,
        }));
    }

    #[test]
    fn place_text_without_fit_uses_given_size() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 50);
        let used = image
            .place_text("AB", Anchor::BottomRight, FontSpec::new("/f.ttf", 12), 0)
            .unwrap();
        assert_eq!(used.size, 12);
        // Measured 24x12
        assert!(engine.get_operations().contains(&RecordedOp::DrawText {
            text: "AB".into(),
            x: 76,
            y: 38,
            angle: 0.0,
            size: 12,
        }));
    }

    #[test]
    fn place_text_fits_then_centers() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 100, 50);
        let used = image
            .place_text("AB", Anchor::MidCenter, FontSpec::new("/f.ttf", 12), 40)
            .unwrap();
        // width = 2 × size first exceeds 40 at size 21 → 42x21
        assert_eq!(used.size, 21);
        assert!(engine.get_operations().contains(&RecordedOp::DrawText {
            text: "AB".into(),
            x: 29,
            y: 14,
            angle: 0.0,
            size: 21,
        }));
    }

    #[test]
    fn place_text_empty_string_with_fit_is_unfittable() {
        let engine = MockEngine::new();
        let mut config = Config::default();
        config.text.max_fit_size = 32;
        let mut image = Image::with_config(&engine, &config);
        image.create_new(10, 10, Color::WHITE).unwrap();

        let result = image.place_text("", Anchor::TopLeft, FontSpec::new("/f.ttf", 12), 5);
        assert!(matches!(
            result,
            Err(ImageError::Unfittable { target_width: 5, .. })
        ));
    }

    // =========================================================================
    // Compositing
    // =========================================================================

    #[test]
    fn place_image_top_right_at_half_transparency() {
        let engine = MockEngine::new();
        let mut base = canvas(&engine, 100, 100);
        let mut logo = Image::new(&engine);
        logo.create_new(20, 20, Color::rgb(255, 0, 0)).unwrap();

        let xy = base
            .place_image(OverlaySource::from(&logo), Anchor::TopRight, 0, 0, 50)
            .unwrap();
        assert_eq!(xy, (80, 0));

        let composite = engine
            .get_operations()
            .into_iter()
            .find(|op| matches!(op, RecordedOp::Composite { .. }))
            .unwrap();
        match composite {
            RecordedOp::Composite {
                x,
                y,
                overlay,
                alphas,
            } => {
                assert_eq!((x, y), (80, 0));
                assert_eq!(overlay, Dimensions::new(20, 20));
                assert_eq!(alphas.len(), 400);
                assert!(alphas.iter().all(|&a| a == 128));
            }
            _ => unreachable!(),
        }
        // The lending image is unchanged
        assert!(logo.pixels().unwrap().pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn place_image_default_transparency_keeps_alpha() {
        let engine = MockEngine::new();
        let mut base = canvas(&engine, 50, 50);
        let mut logo = Image::new(&engine);
        logo.create_new(10, 10, Color::WHITE).unwrap();

        base.place_image(
            (&logo).into(),
            Anchor::BottomLeft,
            0,
            0,
            DEFAULT_PLACE_TRANSPARENCY,
        )
        .unwrap();
        assert_eq!(base.pixels().unwrap().get_pixel(0, 49)[3], 255);
    }

    #[test]
    fn composite_blank_image_is_unsupported_operand() {
        let engine = MockEngine::new();
        let mut base = canvas(&engine, 10, 10);
        let blank = Image::new(&engine);
        let result = base.composite_image((&blank).into(), 0, 0, 0, 0, 0);
        assert!(matches!(result, Err(ImageError::UnsupportedOperand(_))));
    }

    #[test]
    fn composite_path_source_with_resize() {
        let engine = MockEngine::with_decoded(vec![pattern(40, 20)]);
        let mut base = canvas(&engine, 100, 100);
        base.composite_image(OverlaySource::Path(Path::new("/logo.png")), 5, 6, 10, 10, 0)
            .unwrap();

        let ops = engine.get_operations();
        assert!(ops.contains(&RecordedOp::Decode("/logo.png".into())));
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Composite { x: 5, y: 6, overlay, .. } if *overlay == Dimensions::new(10, 5)
        )));
    }

    // =========================================================================
    // Output
    // =========================================================================

    #[test]
    fn output_falls_back_to_default_format() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        let bytes = image.output(None).unwrap();
        assert_eq!(bytes, b"jpg");
        assert_eq!(image.format(), None);
        assert_eq!(
            engine.get_operations().last(),
            Some(&RecordedOp::Encode {
                format: "jpg".into(),
                quality: None,
            })
        );
    }

    #[test]
    fn output_format_argument_is_remembered() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        assert_eq!(image.output(Some("PNG")).unwrap(), b"png");
        assert_eq!(image.format(), Some("png"));
        assert_eq!(image.output(None).unwrap(), b"png");
    }

    #[test]
    fn output_unknown_format_is_undefined() {
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        let result = image.output(Some("xcf"));
        assert!(matches!(result, Err(ImageError::UndefinedFormat(f)) if f == "xcf"));
        assert_eq!(image.format(), None);
    }

    #[test]
    fn configured_default_format_is_used() {
        let engine = MockEngine::new();
        let mut config = Config::default();
        config.output.default_format = "webp".into();
        let mut image = Image::with_config(&engine, &config);
        image.create_new(2, 2, Color::BLACK).unwrap();
        assert_eq!(image.output(None).unwrap(), b"webp");
    }

    #[test]
    fn write_prefers_image_format_then_extension() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);

        let by_extension = tmp.path().join("out.png");
        image.write(&by_extension, 0).unwrap();
        assert_eq!(fs::read(&by_extension).unwrap(), b"png");

        image.set_format("gif");
        let by_format = tmp.path().join("out.png");
        image.write(&by_format, 0).unwrap();
        assert_eq!(fs::read(&by_format).unwrap(), b"gif");
    }

    #[test]
    fn write_without_extension_uses_default() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        let path = tmp.path().join("out");
        image.write(&path, 0).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"jpg");
    }

    #[test]
    fn write_passes_jpeg_quality() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        image.write(tmp.path().join("out.jpg"), 80).unwrap();
        assert_eq!(
            engine.get_operations().last(),
            Some(&RecordedOp::Encode {
                format: "jpg".into(),
                quality: Some(80),
            })
        );
    }

    #[test]
    fn write_unknown_extension_is_undefined() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let mut image = canvas(&engine, 4, 4);
        let path = tmp.path().join("out.xcf");
        let result = image.write(&path, 0);
        assert!(matches!(result, Err(ImageError::UndefinedFormat(_))));
        assert!(!path.exists());
    }
}
