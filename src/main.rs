use clap::{Args, Parser, Subcommand};
use placard::config::{self, Config};
use placard::error::ImageError;
use placard::facade::{DEFAULT_ROTATION, Image};
use placard::imaging::compositor::DEFAULT_PLACE_TRANSPARENCY;
use placard::imaging::{Anchor, Color, FontSpec, ImageEngine, OverlaySource, TextAlign};
use placard::output::{self, OperationReport};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Input and output files of a transforming command.
#[derive(Args, Clone)]
struct Files {
    /// Image to read
    input: PathBuf,
    /// Where to write the result (format from the extension)
    output: PathBuf,
}

/// Target box; a zero axis is derived from the other.
#[derive(Args, Clone)]
struct Size {
    #[arg(long, default_value_t = 0)]
    width: u32,
    #[arg(long, default_value_t = 0)]
    height: u32,
}

#[derive(Parser)]
#[command(name = "placard")]
#[command(about = "Place text and images on rasters")]
#[command(long_about = "\
Place text and images on rasters

Positions are one of nine anchors:

  top-left     top-center     top-right
  mid-left     mid-center     mid-right
  bottom-left  bottom-center  bottom-right

Text can be fitted to a width: the font grows until the text is just wider
than --fit-width. Overlays can be resized and faded (--transparency 0-100)
before they are composited.

Set RUST_LOG=debug to trace each operation.
Run 'placard gen-config' to generate a documented placard.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JPEG quality 1-100 (overrides output.jpeg_quality)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions, format and mime type without decoding pixels
    Info {
        path: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resize, keeping the aspect ratio unless --exact
    Resize {
        #[command(flatten)]
        files: Files,
        #[command(flatten)]
        size: Size,
        /// Stretch to exactly --width x --height
        #[arg(long)]
        exact: bool,
    },
    /// Shrink to fit a box, or fill it with --crop
    Thumbnail {
        #[command(flatten)]
        files: Files,
        #[command(flatten)]
        size: Size,
        /// Cover the box and center-crop the overflow
        #[arg(long)]
        crop: bool,
    },
    /// Cut out a region
    Crop {
        #[command(flatten)]
        files: Files,
        #[command(flatten)]
        size: Size,
        #[arg(long, default_value_t = 0)]
        x: u32,
        #[arg(long, default_value_t = 0)]
        y: u32,
    },
    /// Rotate clockwise
    Rotate {
        #[command(flatten)]
        files: Files,
        #[arg(long, default_value_t = DEFAULT_ROTATION, allow_negative_numbers = true)]
        degrees: f64,
        /// Fill for uncovered corners
        #[arg(long, default_value = "transparent")]
        background: Color,
    },
    /// Draw text at an anchor
    Text {
        #[command(flatten)]
        files: Files,
        #[arg(long)]
        text: String,
        /// Font file (overrides text.font)
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long, default_value = "mid-center")]
        anchor: Anchor,
        /// Pixel size (overrides text.size)
        #[arg(long)]
        size: Option<u32>,
        /// Text color (overrides text.color)
        #[arg(long)]
        color: Option<Color>,
        /// Line alignment for multi-line text
        #[arg(long, default_value = "left")]
        align: TextAlign,
        /// Grow the font until the text is just wider than this
        #[arg(long, default_value_t = 0)]
        fit_width: i64,
    },
    /// Composite another image at an anchor
    Overlay {
        /// Base image
        input: PathBuf,
        /// Image to place on top
        overlay: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "bottom-right")]
        anchor: Anchor,
        #[command(flatten)]
        size: Size,
        /// 0-100; 100 keeps the overlay's own alpha
        #[arg(long, default_value_t = DEFAULT_PLACE_TRANSPARENCY)]
        transparency: u32,
    },
    /// Print a stock placard.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let quality = cli.quality.unwrap_or(config.output.jpeg_quality);
    let engine = ImageEngine::new();
    let run = Run {
        engine: &engine,
        config: &config,
        quality,
    };

    match cli.command {
        Command::Info { path, json } => {
            let info = Image::info(&engine, &path)?;
            if json {
                println!("{}", output::format_info_json(&path, &info)?);
            } else {
                output::print_info(&path, &info);
            }
        }
        Command::Resize { files, size, exact } => {
            run.transform("resize", &files, |image| {
                image.resize(size.width, size.height, !exact)?;
                Ok(Vec::new())
            })?;
        }
        Command::Thumbnail { files, size, crop } => {
            run.transform("thumbnail", &files, |image| {
                image.thumbnail(size.width, size.height, crop)?;
                Ok(Vec::new())
            })?;
        }
        Command::Crop { files, size, x, y } => {
            run.transform("crop", &files, |image| {
                image.crop(size.width, size.height, x, y)?;
                Ok(vec![("Origin".to_string(), format!("{x}, {y}"))])
            })?;
        }
        Command::Rotate {
            files,
            degrees,
            background,
        } => {
            run.transform("rotate", &files, |image| {
                image.rotate(degrees, background)?;
                Ok(vec![("Degrees".to_string(), degrees.to_string())])
            })?;
        }
        Command::Text {
            files,
            text,
            font,
            anchor,
            size,
            color,
            align,
            fit_width,
        } => {
            let font_path = font
                .or_else(|| config.text.font.as_ref().map(PathBuf::from))
                .ok_or("no font given: pass --font or set text.font in the config")?;
            let color = match color {
                Some(c) => c,
                None => config.text.color.parse()?,
            };
            let font = FontSpec::new(font_path, size.unwrap_or(config.text.size))
                .with_color(color)
                .with_align(align);

            run.transform("text", &files, |image| {
                let used = image.place_text(&text, anchor, font, fit_width)?;
                Ok(vec![
                    ("Anchor".to_string(), anchor.to_string()),
                    ("Font size".to_string(), used.size.to_string()),
                ])
            })?;
        }
        Command::Overlay {
            input,
            overlay,
            output,
            anchor,
            size,
            transparency,
        } => {
            let files = Files { input, output };
            run.transform("overlay", &files, |image| {
                let (x, y) = image.place_image(
                    OverlaySource::Path(&overlay),
                    anchor,
                    size.width,
                    size.height,
                    transparency,
                )?;
                Ok(vec![
                    ("Overlay".to_string(), overlay.display().to_string()),
                    ("Position".to_string(), format!("{x}, {y}")),
                ])
            })?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Shared context for file-to-file commands.
struct Run<'a> {
    engine: &'a ImageEngine,
    config: &'a Config,
    quality: u32,
}

impl Run<'_> {
    /// Load `files.input`, apply `op`, write `files.output` and print a summary.
    fn transform(
        &self,
        command: &'static str,
        files: &Files,
        op: impl FnOnce(&mut Image<'_, ImageEngine>) -> Result<Vec<(String, String)>, ImageError>,
    ) -> Result<(), ImageError> {
        let mut image = Image::with_config(self.engine, self.config);
        image.load(&files.input)?;
        let before = image.dimensions();

        let details = op(&mut image)?;

        apply_output_extension(&mut image, &files.output);
        image.write(&files.output, self.quality)?;

        let mut report = OperationReport {
            command,
            input: files.input.clone(),
            output: files.output.clone(),
            before,
            after: image.dimensions(),
            details,
        };
        if self.quality > 0 {
            report = report.detail("Quality", self.quality);
        }
        output::print_operation(&report);
        Ok(())
    }
}

/// The output file's extension wins over the format the input was loaded with.
fn apply_output_extension(image: &mut Image<'_, ImageEngine>, path: &Path) {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        image.set_format(ext);
    }
}
