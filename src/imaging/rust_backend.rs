//! Pure Rust raster engine.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Primitive | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate, normalized to RGBA8 |
//! | Resize | `image::imageops::resize` with the configured filter |
//! | Thumbnail (fill) | `image::DynamicImage::resize_to_fill` |
//! | Crop | `image::imageops::crop_imm` |
//! | Rotate | `imageops::rotate90/180/270`, bilinear resampling otherwise |
//! | Composite | `image::imageops::overlay` (alpha "over") |
//! | Text metrics / drawing | `ab_glyph` outlines, kerning-aware layout |
//! | Encode | `image` encoders; JPEG via `JpegEncoder::new_with_quality` |

use super::backend::{
    Dimensions, EncodeOptions, EngineError, ImageInfo, PixelBuffer, RasterEngine, RasterSource,
    TextMetrics,
};
use super::geometry::resize_dimensions;
use super::params::{Color, FontSpec, ResizeFilter, TextAlign};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Pixel, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Raster engine backed by the `image` and `ab_glyph` crates.
///
/// Fonts are read from disk once per path and cached for the engine's lifetime.
/// See the [module docs](self) for the crate-to-primitive mapping.
#[derive(Default)]
pub struct ImageEngine {
    fonts: Mutex<HashMap<PathBuf, FontArc>>,
}

impl ImageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn font(&self, path: &Path) -> Result<FontArc, EngineError> {
        let mut fonts = self
            .fonts
            .lock()
            .map_err(|_| EngineError::Font("font cache poisoned".to_string()))?;
        if let Some(font) = fonts.get(path) {
            return Ok(font.clone());
        }
        let data = std::fs::read(path)?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| EngineError::Font(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded font");
        fonts.insert(path.to_path_buf(), font.clone());
        Ok(font)
    }
}

/// Look up an encodable format by name (`"jpg"`, `"jpeg"`, `"png"`, ...).
pub fn format_from_name(name: &str) -> Option<ImageFormat> {
    ImageFormat::from_extension(name.trim_start_matches('.')).filter(|f| f.writing_enabled())
}

/// Canonical lowercase extension for a format (`Jpeg` → `"jpg"`).
fn canonical_extension(format: ImageFormat) -> Option<String> {
    format.extensions_str().first().map(|e| e.to_string())
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

// =============================================================================
// Rotation
// =============================================================================

/// Rotate clockwise by an arbitrary angle, growing the canvas to the rotated
/// bounding box and filling uncovered pixels with `fill`.
fn rotate_any(src: &RgbaImage, degrees: f64, fill: Rgba<u8>) -> RgbaImage {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (src.width() as f64, src.height() as f64);

    let dst_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let dst_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (dcx, dcy) = (dst_w as f64 / 2.0, dst_h as f64 / 2.0);

    RgbaImage::from_fn(dst_w, dst_h, |dx, dy| {
        // Inverse rotation from destination pixel center back into the source
        let rx = dx as f64 + 0.5 - dcx;
        let ry = dy as f64 + 0.5 - dcy;
        let sx = rx * cos + ry * sin + cx - 0.5;
        let sy = -rx * sin + ry * cos + cy - 0.5;
        sample_bilinear(src, sx, sy).unwrap_or(fill)
    })
}

fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> Option<Rgba<u8>> {
    let max_x = src.width() as f64 - 1.0;
    let max_y = src.height() as f64 - 1.0;
    if !(0.0..=max_x).contains(&sx) || !(0.0..=max_y).contains(&sy) {
        return None;
    }

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let fx = sx - x0 as f64;
    let fy = sy - y0 as f64;

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x1, y0);
    let p01 = src.get_pixel(x0, y1);
    let p11 = src.get_pixel(x1, y1);

    let channel = |c: usize| -> u8 {
        let v = p00[c] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f64 * fx * (1.0 - fy)
            + p01[c] as f64 * (1.0 - fx) * fy
            + p11[c] as f64 * fx * fy;
        v.round().clamp(0.0, 255.0) as u8
    };
    Some(Rgba([channel(0), channel(1), channel(2), channel(3)]))
}

// =============================================================================
// Text layout
// =============================================================================

struct LineLayout<'t> {
    text: &'t str,
    width: f32,
}

struct TextLayout<'t> {
    lines: Vec<LineLayout<'t>>,
    ascent: f32,
    line_advance: f32,
    width: f32,
    height: f32,
}

/// Kerning-aware advance width of a single line.
fn line_width<F: Font, SF: ScaleFont<F>>(scaled: &SF, line: &str) -> f32 {
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in line.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

fn layout_text<'t>(font: &FontArc, size: u32, text: &'t str) -> TextLayout<'t> {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    let lines: Vec<LineLayout<'t>> = text
        .split('\n')
        .map(|line| LineLayout {
            text: line,
            width: line_width(&scaled, line),
        })
        .collect();

    let line_height = scaled.height();
    let line_advance = line_height + scaled.line_gap();
    let width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
    let height = line_height + line_advance * (lines.len().saturating_sub(1)) as f32;

    TextLayout {
        lines,
        ascent: scaled.ascent(),
        line_advance,
        width,
        height,
    }
}

/// Rasterize laid-out text onto a transparent layer the size of its box.
fn render_text_layer(
    font: &FontArc,
    style: &FontSpec,
    layout: &TextLayout<'_>,
) -> RgbaImage {
    let scale = PxScale::from(style.size as f32);
    let scaled = font.as_scaled(scale);
    let layer_w = (layout.width.ceil() as u32).max(1);
    let layer_h = (layout.height.ceil() as u32).max(1);
    let mut layer = RgbaImage::new(layer_w, layer_h);

    for (index, line) in layout.lines.iter().enumerate() {
        let baseline = layout.ascent + layout.line_advance * index as f32;
        let mut cursor = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (layout.width - line.width) / 2.0,
            TextAlign::Right => layout.width - line.width,
        };

        let mut prev: Option<GlyphId> = None;
        for c in line.text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(cursor, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i64 + bounds.min.x as i64;
                    let y = py as i64 + bounds.min.y as i64;
                    if x < 0 || y < 0 || x >= layer_w as i64 || y >= layer_h as i64 {
                        return;
                    }
                    let alpha = (coverage.clamp(0.0, 1.0) * style.color.a as f32).round() as u8;
                    let ink = Rgba([style.color.r, style.color.g, style.color.b, alpha]);
                    layer.get_pixel_mut(x as u32, y as u32).blend(&ink);
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
    layer
}

impl RasterEngine for ImageEngine {
    type Raster = RgbaImage;

    fn create_canvas(
        &self,
        size: Dimensions,
        background: Color,
    ) -> Result<RgbaImage, EngineError> {
        Ok(RgbaImage::from_pixel(
            size.width,
            size.height,
            rgba(background),
        ))
    }

    fn identify(&self, path: &Path) -> Result<ImageInfo, EngineError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format();
        let (width, height) = reader.into_dimensions().map_err(|e| {
            EngineError::Decode(format!("Failed to read dimensions of {}: {}", path.display(), e))
        })?;
        Ok(ImageInfo {
            dimensions: Dimensions::new(width, height),
            format: format.and_then(canonical_extension),
            mime: format.map(|f| f.to_mime_type().to_string()),
        })
    }

    fn decode(&self, source: RasterSource<'_>) -> Result<RgbaImage, EngineError> {
        let decoded = match source {
            RasterSource::Path(path) => ImageReader::open(path)?
                .with_guessed_format()?
                .decode()
                .map_err(|e| EngineError::Decode(format!("{}: {}", path.display(), e)))?,
            RasterSource::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| EngineError::Decode(format!("{} bytes: {}", bytes.len(), e)))?,
        };
        Ok(decoded.into_rgba8())
    }

    fn resize(
        &self,
        raster: &mut RgbaImage,
        size: Dimensions,
        filter: ResizeFilter,
        best_fit: bool,
    ) -> Result<Dimensions, EngineError> {
        let target = resize_dimensions(raster.geometry(), size, best_fit);
        if target != raster.geometry() {
            *raster = imageops::resize(&*raster, target.width, target.height, filter_type(filter));
        }
        Ok(raster.geometry())
    }

    fn thumbnail(
        &self,
        raster: &mut RgbaImage,
        size: Dimensions,
        filter: ResizeFilter,
        fill: bool,
    ) -> Result<Dimensions, EngineError> {
        if fill && size.width > 0 && size.height > 0 {
            let source = std::mem::replace(raster, RgbaImage::new(0, 0));
            *raster = DynamicImage::ImageRgba8(source)
                .resize_to_fill(size.width, size.height, filter_type(filter))
                .into_rgba8();
        } else {
            let target = resize_dimensions(raster.geometry(), size, true);
            *raster = imageops::resize(&*raster, target.width, target.height, filter_type(filter));
        }
        Ok(raster.geometry())
    }

    fn crop(
        &self,
        raster: &mut RgbaImage,
        size: Dimensions,
        x: u32,
        y: u32,
    ) -> Result<Dimensions, EngineError> {
        *raster = imageops::crop_imm(&*raster, x, y, size.width, size.height).to_image();
        Ok(raster.geometry())
    }

    fn rotate(
        &self,
        raster: &mut RgbaImage,
        degrees: f64,
        fill: Color,
    ) -> Result<Dimensions, EngineError> {
        let normalized = degrees.rem_euclid(360.0);
        let near = |target: f64| (normalized - target).abs() < 1e-9;
        if near(0.0) || near(360.0) {
            return Ok(raster.geometry());
        }
        *raster = if near(90.0) {
            imageops::rotate90(&*raster)
        } else if near(180.0) {
            imageops::rotate180(&*raster)
        } else if near(270.0) {
            imageops::rotate270(&*raster)
        } else {
            rotate_any(raster, normalized, rgba(fill))
        };
        Ok(raster.geometry())
    }

    fn composite_over(
        &self,
        canvas: &mut RgbaImage,
        overlay: &RgbaImage,
        x: i64,
        y: i64,
    ) -> Result<(), EngineError> {
        imageops::overlay(canvas, overlay, x, y);
        Ok(())
    }

    fn measure_text(&self, font: &FontSpec, text: &str) -> Result<TextMetrics, EngineError> {
        let face = self.font(&font.path)?;
        let layout = layout_text(&face, font.size, text);
        Ok(TextMetrics {
            width: layout.width.ceil() as u32,
            height: layout.height.ceil() as u32,
        })
    }

    fn draw_text(
        &self,
        raster: &mut RgbaImage,
        font: &FontSpec,
        text: &str,
        x: i64,
        y: i64,
        angle: f64,
    ) -> Result<(), EngineError> {
        let face = self.font(&font.path)?;
        let layout = layout_text(&face, font.size, text);
        let mut layer = render_text_layer(&face, font, &layout);
        let (mut x, mut y) = (x, y);

        if angle.rem_euclid(360.0).abs() > 1e-9 {
            let (before_w, before_h) = (layer.width() as i64, layer.height() as i64);
            layer = rotate_any(&layer, angle.rem_euclid(360.0), rgba(Color::TRANSPARENT));
            // Keep the rotated text centered where the upright box would be
            x -= (layer.width() as i64 - before_w) / 2;
            y -= (layer.height() as i64 - before_h) / 2;
        }

        imageops::overlay(raster, &layer, x, y);
        Ok(())
    }

    fn encode(&self, raster: &RgbaImage, options: &EncodeOptions) -> Result<Vec<u8>, EngineError> {
        let format = format_from_name(&options.format)
            .ok_or_else(|| EngineError::UnsupportedFormat(options.format.clone()))?;
        let mut out = Cursor::new(Vec::new());

        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(raster.clone()).into_rgb8();
                let quality = options.jpeg_quality.map_or(75, |q| q.value()) as u8;
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(encoder)
                    .map_err(|e| EngineError::Encode(format!("JPEG encode failed: {}", e)))?;
            }
            other => {
                DynamicImage::ImageRgba8(raster.clone())
                    .write_to(&mut out, other)
                    .map_err(|e| {
                        EngineError::Encode(format!("{} encode failed: {}", options.format, e))
                    })?;
            }
        }

        let bytes = out.into_inner();
        debug!(format = %options.format, bytes = bytes.len(), "encoded image");
        Ok(bytes)
    }
}
