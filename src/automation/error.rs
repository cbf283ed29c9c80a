use crate::config::ConfigError;
use crate::device::{CaptureError, InputError};
use crate::templates::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for automation runs.
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error(
        "Missing required templates: {}. Add these PNG files to {dir:?} and run again.",
        names.iter().map(|n| format!("{n}.png")).collect::<Vec<_>>().join(", ")
    )]
    MissingTemplates { names: Vec<String>, dir: PathBuf },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load templates: {source}")]
    Template {
        #[from]
        source: TemplateError,
    },

    #[error("Capture failed during a required stage: {source}")]
    Capture {
        #[from]
        source: CaptureError,
    },

    #[error("Input failed during a required stage: {source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: &'static str, reason: String },

    #[error("Parent node state is unknown and the open fallback is disabled")]
    UnknownParentState,
}
