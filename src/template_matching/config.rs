//! Configuration for template matching operations

use crate::config::{AutomationConfig, MatchingAlgorithm};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Which pipeline `find` runs
    pub algorithm: MatchingAlgorithm,
    /// Apply the per-class threshold correction and allow the relaxation retry
    pub adaptive_confidence: bool,
    /// Whether to use multi-scale matching
    pub enable_multiscale: bool,
    /// Whether to fall back to preprocessed representations
    pub enable_preprocessing: bool,
    /// Smallest and largest template scale tried
    pub scale_range: [f32; 2],
    /// Number of evenly spaced scales across `scale_range`
    pub scale_steps: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            algorithm: MatchingAlgorithm::Enhanced,
            adaptive_confidence: true,
            enable_multiscale: true,
            enable_preprocessing: true,
            scale_range: [0.8, 1.2],
            scale_steps: 9,
        }
    }
}

impl MatchConfig {
    pub fn from_automation(config: &AutomationConfig) -> Self {
        Self {
            algorithm: config.matching_algorithm,
            adaptive_confidence: config.adaptive_confidence,
            enable_multiscale: config.enable_multi_scale,
            enable_preprocessing: config.enable_preprocessing,
            scale_range: config.scale_range,
            scale_steps: config.scale_steps,
        }
    }

    /// Evenly spaced scales, ascending, ends included
    pub fn scales(&self) -> Vec<f32> {
        let [min, max] = self.scale_range;
        match self.scale_steps {
            0 => Vec::new(),
            1 => vec![min],
            n => (0..n)
                .map(|i| min + (max - min) * i as f32 / (n - 1) as f32)
                .collect(),
        }
    }
}

/// Preset for fast single-method lookups
pub fn create_basic_config() -> MatchConfig {
    MatchConfig {
        algorithm: MatchingAlgorithm::Basic,
        enable_multiscale: false,
        enable_preprocessing: false,
        ..MatchConfig::default()
    }
}

/// Preset for the three-method comparison without fallbacks
pub fn create_multi_method_config() -> MatchConfig {
    MatchConfig {
        algorithm: MatchingAlgorithm::MultiMethod,
        enable_multiscale: false,
        enable_preprocessing: false,
        ..MatchConfig::default()
    }
}
