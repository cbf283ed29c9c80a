/// Template matching module for locating UI elements in screen captures
///
/// This module provides:
/// - Normalized correlation scoring over colour frames
/// - Per-class threshold correction
/// - Multi-scale and preprocessed fallbacks with a relaxed retry
/// - Match visualization for debugging
pub mod confidence;
pub mod config;
pub mod correlate;
pub mod debug;
pub mod matcher;
pub mod preprocess;
pub mod types;


pub use config::{MatchConfig, create_basic_config, create_multi_method_config};
pub use matcher::TemplateMatcher;
pub use types::{Candidate, MatchMethod, MatchResult, MatchStrategy, Representation};
