use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for frame capture.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A specialized `Result` type for input injection.
pub type InputResult<T> = Result<T, InputError>;

/// The error type for frame acquisition.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture is unavailable: {description}")]
    Unavailable { description: String },

    #[error("Failed to read screenshot {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No frames left to replay")]
    Exhausted,

    #[error("Capture region {width}x{height} is empty")]
    EmptyRegion { width: u32, height: u32 },
}

/// The error type for mouse and keyboard injection.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Click coordinates are out of bounds: x={x}, y={y}")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Input injection failed: {description}")]
    Rejected { description: String },
}
