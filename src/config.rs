//! Facade configuration.
//!
//! Defaults the facade and CLI fall back to when a call doesn't say otherwise:
//! output format, JPEG quality, resize filter and text settings.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! default_format = "jpg"    # Used when neither the call nor the image names one
//! jpeg_quality = 0          # 1-100; 0 keeps the encoder default
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmullrom | gaussian | lanczos3
//!
//! [text]
//! font = "fonts/DejaVuSans.ttf"  # Font file for CLI text commands (no default)
//! size = 24                 # Pixel size when no fit width is requested
//! color = "#000000"         # Name or #RGB, #RGBA, #RRGGBB, #RRGGBBAA
//! max_fit_size = 4096       # Upper bound for font-size fitting (at most 65536)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Color, ResizeFilter, text_fit::DEFAULT_MAX_FONT_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest `text.max_fit_size` a config may ask for.
pub const MAX_FIT_SIZE_LIMIT: u32 = 65_536;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from a TOML file.
///
/// All fields have defaults; a file need only specify the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub resize: ResizeConfig,
    pub text: TextConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 0-100".into(),
            ));
        }
        if self.output.default_format.is_empty()
            || !self
                .output
                .default_format
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Validation(format!(
                "output.default_format '{}' is not a format name",
                self.output.default_format
            )));
        }
        if self.text.size == 0 {
            return Err(ConfigError::Validation("text.size must be positive".into()));
        }
        if self.text.max_fit_size == 0 || self.text.max_fit_size > MAX_FIT_SIZE_LIMIT {
            return Err(ConfigError::Validation(format!(
                "text.max_fit_size must be 1-{MAX_FIT_SIZE_LIMIT}"
            )));
        }
        self.text
            .color
            .parse::<Color>()
            .map_err(|e| ConfigError::Validation(format!("text.color: {e}")))?;
        Ok(())
    }
}

/// Encoding defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Format used by `output`/`write` when the image has none set.
    pub default_format: String,
    /// JPEG quality for CLI writes. `0` keeps the encoder default.
    pub jpeg_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "jpg".to_string(),
            jpeg_quality: 0,
        }
    }
}

/// Resampling settings shared by resize, thumbnail and overlay resizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
}

/// Text rendering defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Font file path. There is no built-in font.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    pub size: u32,
    pub color: String,
    pub max_fit_size: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: None,
            size: 24,
            color: "#000000".to_string(),
            max_fit_size: DEFAULT_MAX_FONT_SIZE,
        }
    }
}

/// Load and validate a config file.
///
/// The path was named explicitly, so a missing file is an IO error rather
/// than a silent fallback to defaults. Invalid TOML or unknown keys are errors
/// too.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate config from TOML text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# placard configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[output]
# Format used when neither the command nor the source image names one.
default_format = "jpg"
# JPEG quality (1-100). 0 keeps the encoder's own default.
jpeg_quality = 0

# ---------------------------------------------------------------------------
# Resampling
# ---------------------------------------------------------------------------
[resize]
# One of: nearest, triangle, catmullrom, gaussian, lanczos3.
# Also used when an overlay is resized before compositing.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# Text
# ---------------------------------------------------------------------------
[text]
# Path to a TrueType/OpenType font file. Required by the `text` command
# unless --font is given.
# font = "fonts/DejaVuSans.ttf"
# Pixel size used when no fit width is requested.
size = 24
# Text color: a name (black, white, transparent) or #RGB, #RGBA, #RRGGBB, #RRGGBBAA.
color = "#000000"
# Font-size fitting gives up past this size (e.g. for empty text). At most 65536.
max_fit_size = 4096
"##
}
