//! Per-class threshold correction

use crate::templates::SemanticClass;

/// Lowest threshold any template is matched at
pub const MIN_THRESHOLD: f32 = 0.5;
/// Highest threshold any template is matched at
pub const MAX_THRESHOLD: f32 = 0.95;
/// Amount the relaxation retry lowers the threshold by
pub const RELAXATION_STEP: f32 = 0.2;
/// Thresholds at or below this are never relaxed
pub const RELAXATION_FLOOR: f32 = 0.6;

/// Threshold correction for a semantic class. Small icons and menu entries render
/// with more variation than tree rows and buttons.
pub fn class_adjustment(class: SemanticClass) -> f32 {
    match class {
        SemanticClass::Icon => -0.10,
        SemanticClass::MenuItem | SemanticClass::ChildNode => -0.05,
        SemanticClass::TreeNode | SemanticClass::Button | SemanticClass::Element => 0.0,
    }
}

/// Effective threshold: base plus the class correction when adaptive, always clamped.
pub fn effective_threshold(base: f32, class: SemanticClass, adaptive: bool) -> f32 {
    let adjusted = if adaptive {
        base + class_adjustment(class)
    } else {
        base
    };
    let clamped = adjusted.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
    if (clamped - base).abs() > f32::EPSILON {
        log::debug!(
            "🎚️ Threshold for {:?}: {:.3} -> {:.3}",
            class,
            base,
            clamped
        );
    }
    clamped
}

/// Threshold for the relaxation retry, if the threshold is high enough to relax
pub fn relaxed_threshold(threshold: f32) -> Option<f32> {
    (threshold > RELAXATION_FLOOR).then(|| (threshold - RELAXATION_STEP).max(MIN_THRESHOLD))
}
