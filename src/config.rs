//! Typed automation configuration loaded from a flat JSON document.
//!
//! Every key has an explicit default; values are validated once at load time so the
//! rest of the crate never has to second-guess them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A specialized `Result` type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingAlgorithm {
    /// Correlation coefficient only
    Basic,
    /// Adaptive threshold plus the three-method comparison
    MultiMethod,
    /// Full escalating pipeline
    Enhanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Click one fixed-offset child, select-all, confirm
    SinglePass,
    /// Walk every child below the parent until the failure budget runs out
    FullWalk,
    /// Locate each configured child by its own template
    PerChild,
}

/// One link of the per-child action chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub template: String,
    #[serde(default)]
    pub optional: bool,
}

impl ChainStep {
    pub fn required(template: &str) -> Self {
        Self {
            template: template.to_string(),
            optional: false,
        }
    }

    pub fn optional(template: &str) -> Self {
        Self {
            template: template.to_string(),
            optional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Base confidence for every template (0.0 to 1.0)
    pub confidence_threshold: f32,
    /// Minimum open/closed confidence gap for a decisive node state
    pub confidence_diff_threshold: f32,
    /// Per-template base confidence overrides
    pub template_confidence: HashMap<String, f32>,

    /// Seconds to wait after each click
    pub click_delay: f64,
    /// Seconds to wait after opening a node and between children
    pub operation_delay: f64,
    /// Seconds to wait for a menu to render before capturing it
    pub menu_delay: f64,

    /// Height of one tree row in logical pixels
    pub node_height: u32,
    /// Frame pixels per input pixel
    #[serde(alias = "manual_dpr")]
    pub display_scale: f64,

    pub matching_algorithm: MatchingAlgorithm,
    pub enable_multi_scale: bool,
    pub enable_preprocessing: bool,
    pub adaptive_confidence: bool,
    pub scale_range: [f32; 2],
    pub scale_steps: usize,

    #[serde(alias = "window_title", deserialize_with = "one_or_many")]
    pub window_titles: Vec<String>,
    #[serde(alias = "app_name", deserialize_with = "one_or_many")]
    pub app_names: Vec<String>,

    pub templates_dir: PathBuf,

    pub traversal_mode: TraversalMode,
    /// Children addressed directly before pagination starts
    pub direct_children: usize,
    pub pagination_stride: usize,
    pub pagination_base_offset: usize,
    pub single_pass_child_offset: usize,
    pub failure_budget_full_walk: usize,
    pub failure_budget_per_child: usize,
    pub max_children: Option<usize>,

    pub recovery_cursor_shift: i32,
    pub recovery_scrolls_full_walk: usize,
    pub recovery_scrolls_single_pass: usize,
    pub assume_open_on_unknown: bool,

    pub chain_steps: Vec<ChainStep>,
    #[serde(alias = "attachment_subnodes")]
    pub child_templates: Vec<String>,

    pub debug_mode: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            confidence_diff_threshold: 0.05,
            template_confidence: HashMap::new(),
            click_delay: 5.0,
            operation_delay: 2.0,
            menu_delay: 0.5,
            node_height: 20,
            display_scale: 1.0,
            matching_algorithm: MatchingAlgorithm::Enhanced,
            enable_multi_scale: true,
            enable_preprocessing: true,
            adaptive_confidence: true,
            scale_range: [0.8, 1.2],
            scale_steps: 9,
            window_titles: vec!["Spine".to_string()],
            app_names: Vec::new(),
            templates_dir: PathBuf::from("templates"),
            traversal_mode: TraversalMode::FullWalk,
            direct_children: 10,
            pagination_stride: 3,
            pagination_base_offset: 9,
            single_pass_child_offset: 1,
            failure_budget_full_walk: 1,
            failure_budget_per_child: 2,
            max_children: None,
            recovery_cursor_shift: 40,
            recovery_scrolls_full_walk: 10,
            recovery_scrolls_single_pass: 3,
            assume_open_on_unknown: true,
            chain_steps: vec![
                ChainStep::required("grid_edit"),
                ChainStep::required("grid_draw"),
                ChainStep::optional("draw_sure"),
            ],
            child_templates: Vec::new(),
            debug_mode: false,
        }
    }
}

impl AutomationConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str, path: &Path) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk; a missing file yields the defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::info!("⚙️ Config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json, path)?;
        log::info!("⚙️ Config loaded from {:?}", path);
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_error = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| write_error(e.into()))?;
        writer.flush().map_err(write_error)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_unit("confidence_threshold", self.confidence_threshold)?;
        check_unit("confidence_diff_threshold", self.confidence_diff_threshold)?;
        for value in self.template_confidence.values() {
            check_unit("template_confidence", *value)?;
        }
        check_delay("click_delay", self.click_delay)?;
        check_delay("operation_delay", self.operation_delay)?;
        check_delay("menu_delay", self.menu_delay)?;

        if self.node_height == 0 {
            return invalid("node_height", "must be greater than zero");
        }
        if !(self.display_scale.is_finite() && self.display_scale > 0.0) {
            return invalid("display_scale", format!("{} is not a positive scale", self.display_scale));
        }

        let [min, max] = self.scale_range;
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return invalid("scale_range", format!("[{min}, {max}] must satisfy 0 < min <= max"));
        }
        if self.scale_steps == 0 {
            return invalid("scale_steps", "must be at least 1");
        }

        if self.pagination_stride == 0 {
            return invalid("pagination_stride", "must be at least 1");
        }
        if self.failure_budget_full_walk == 0 {
            return invalid("failure_budget_full_walk", "must be at least 1");
        }
        if self.failure_budget_per_child == 0 {
            return invalid("failure_budget_per_child", "must be at least 1");
        }
        if self.single_pass_child_offset == 0 {
            return invalid("single_pass_child_offset", "must be at least 1");
        }
        if self.recovery_cursor_shift < 0 {
            return invalid("recovery_cursor_shift", "must not be negative");
        }
        if let Some(step) = self.chain_steps.iter().find(|s| s.template.trim().is_empty()) {
            return invalid("chain_steps", format!("step {:?} has an empty template name", step));
        }
        Ok(())
    }

    /// Base confidence for a named template
    pub fn base_confidence_for(&self, template: &str) -> f32 {
        self.template_confidence
            .get(template)
            .copied()
            .unwrap_or(self.confidence_threshold)
    }

    /// Consecutive-failure budget of the enumeration loop. Single pass runs one chain
    /// and never consults it.
    pub fn failure_budget(&self) -> usize {
        match self.traversal_mode {
            TraversalMode::PerChild => self.failure_budget_per_child,
            TraversalMode::FullWalk | TraversalMode::SinglePass => self.failure_budget_full_walk,
        }
    }

    /// Upward scrolls issued by node-state recovery in the configured mode
    pub fn recovery_scrolls(&self) -> usize {
        match self.traversal_mode {
            TraversalMode::SinglePass => self.recovery_scrolls_single_pass,
            TraversalMode::FullWalk | TraversalMode::PerChild => self.recovery_scrolls_full_walk,
        }
    }
}

fn invalid<T>(field: &'static str, reason: impl Into<String>) -> ConfigResult<T> {
    Err(ConfigError::Invalid {
        field,
        reason: reason.into(),
    })
}

fn check_unit(field: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(field, format!("{value} is outside 0.0..=1.0"))
    }
}

fn check_delay(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        invalid(field, format!("{value} is not a non-negative number of seconds"))
    }
}

/// Accept either `"Spine"` or `["Spine", "Spine Pro"]`; null means empty.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}
