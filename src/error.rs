//! Errors surfaced by the [`Image`](crate::facade::Image) facade.
//!
//! Every variant aborts the current call; nothing is retried. The one local
//! recovery in the crate is `output` falling back to the configured default
//! format, which happens before any error could be raised.

use crate::imaging::EngineError;
use crate::imaging::text_fit::FitError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    /// The path given to `load` or `info` does not exist.
    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// A mutating or output operation was called on a blank image.
    #[error("Image is empty; create or load one first")]
    EmptyImage,

    /// No encoder is known for the requested format name.
    #[error("Undefined image format: {0}")]
    UndefinedFormat(String),

    /// A composite source that exposes no raster.
    #[error("Unsupported operand: {0}")]
    UnsupportedOperand(String),

    /// Font fitting ran past its size ceiling without exceeding the target.
    #[error("Text {text:?} cannot be fitted to {target_width}px")]
    Unfittable { text: String, target_width: i64 },

    #[error("Engine error: {0}")]
    Engine(EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for ImageError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnsupportedFormat(format) => ImageError::UndefinedFormat(format),
            other => ImageError::Engine(other),
        }
    }
}

impl From<FitError> for ImageError {
    fn from(err: FitError) -> Self {
        match err {
            FitError::Unfittable {
                text, target_width, ..
            } => ImageError::Unfittable { text, target_width },
            FitError::Engine(e) => e.into(),
        }
    }
}
