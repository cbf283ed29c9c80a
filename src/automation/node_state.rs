//! Open/closed classification of a togglable tree node.
//!
//! The open and closed references are scored independently on the same frame; the
//! difference between the two confidences decides the state, with a conservative
//! tie-break when they are close.

use super::context::AutomationContext;
use super::types::{NodeDetection, NodeState};
use crate::device::{
    Capture, CaptureRegion, CaptureResult, Frame, InputDispatcher, Position, ScrollDirection,
};
use crate::templates::{NODE_CLOSED, NODE_OPEN};

/// Score of one reference image on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceScore {
    pub confidence: f32,
    /// Set only when `confidence` reaches `threshold`
    pub position: Option<Position>,
    /// Absolute threshold of this reference
    pub threshold: f32,
}

impl ReferenceScore {
    pub fn new(confidence: f32, position: Position, threshold: f32) -> Self {
        Self {
            confidence,
            position: (confidence >= threshold).then_some(position),
            threshold,
        }
    }

    /// A reference that is not loaded contributes confidence 0
    pub fn absent(threshold: f32) -> Self {
        Self {
            confidence: 0.0,
            position: None,
            threshold,
        }
    }
}

/// Decide the node state from the two reference scores
pub fn classify(open: &ReferenceScore, close: &ReferenceScore, diff_threshold: f32) -> NodeDetection {
    let delta = open.confidence - close.confidence;
    let decided = |state, score: &ReferenceScore| NodeDetection {
        state,
        position: score.position,
        confidence: score.confidence,
        open_confidence: open.confidence,
        close_confidence: close.confidence,
        assumed: false,
    };

    if delta > diff_threshold && open.position.is_some() {
        return decided(NodeState::Open, open);
    }
    if -delta > diff_threshold && close.position.is_some() {
        return decided(NodeState::Closed, close);
    }

    // Ambiguous: trust the stronger side only if it clears its own threshold
    let larger = if open.confidence >= close.confidence { open } else { close };
    if larger.confidence >= larger.threshold {
        if open.confidence >= close.confidence && open.position.is_some() {
            return decided(NodeState::Open, open);
        }
        if close.position.is_some() {
            return decided(NodeState::Closed, close);
        }
    }

    NodeDetection::unknown(open.confidence, close.confidence)
}

pub struct NodeStateDetector<'a> {
    context: &'a AutomationContext,
}

impl<'a> NodeStateDetector<'a> {
    pub fn new(context: &'a AutomationContext) -> Self {
        Self { context }
    }

    fn score(&self, frame: &Frame, name: &str) -> ReferenceScore {
        let threshold = self.context.config.base_confidence_for(name);
        let Some(template) = self.context.templates.get(name) else {
            log::debug!("🔍 Reference '{}' not loaded, scoring 0", name);
            return ReferenceScore::absent(threshold);
        };
        match self.context.matcher.best_candidate(frame, template) {
            Some(candidate) => ReferenceScore::new(candidate.confidence, candidate.position, threshold),
            None => ReferenceScore::absent(threshold),
        }
    }

    /// Classify the parent node in `frame`
    pub fn detect(&self, frame: &Frame) -> NodeDetection {
        let open = self.score(frame, NODE_OPEN);
        let close = self.score(frame, NODE_CLOSED);
        let detection = classify(&open, &close, self.context.config.confidence_diff_threshold);
        log::info!(
            "🌳 Node state {:?} (open {:.3}, closed {:.3})",
            detection.state,
            detection.open_confidence,
            detection.close_confidence
        );
        detection
    }

    /// Detect, and on Unknown scroll back to the top and try once more. When still
    /// Unknown, either guess Open at the shifted anchor or return Unknown, depending
    /// on `assume_open_on_unknown`. A failed recapture is returned as an error.
    pub fn detect_with_recovery<C: Capture, I: InputDispatcher>(
        &self,
        frame: &Frame,
        capture: &mut C,
        input: &mut I,
        region: Option<&CaptureRegion>,
        anchor: Position,
    ) -> CaptureResult<NodeDetection> {
        let detection = self.detect(frame);
        if !detection.is_unknown() {
            return Ok(detection);
        }

        let config = &self.context.config;
        let shifted = anchor.shifted(-config.recovery_cursor_shift, 0);
        let scrolls = config.recovery_scrolls();
        log::warn!(
            "⚠️ Node state ambiguous, scrolling up {} times at {} and retrying",
            scrolls,
            shifted
        );
        for _ in 0..scrolls {
            if !input.scroll(ScrollDirection::Up, shifted.x, shifted.y, region) {
                log::debug!("🖱️ Recovery scroll rejected");
            }
        }

        // A failed recapture is not an ambiguous node; never guess from it
        let retried = self.detect(&capture.take(region)?);
        if !retried.is_unknown() {
            return Ok(retried);
        }

        if config.assume_open_on_unknown {
            log::warn!(
                "⚠️ Node state still unknown, assuming Open at {} (unverified)",
                shifted
            );
            Ok(NodeDetection::assumed_open(shifted, &retried))
        } else {
            log::error!("❌ Node state still unknown after recovery");
            Ok(retried)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(confidence: f32, threshold: f32) -> ReferenceScore {
        ReferenceScore::new(confidence, Position::new(10, 20), threshold)
    }

    #[test]
    fn test_clear_open() {
        let detection = classify(&score(0.90, 0.8), &score(0.30, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Open);
        assert_eq!(detection.confidence, 0.90);
        assert_eq!(detection.position, Some(Position::new(10, 20)));
        assert!(!detection.assumed);
    }

    #[test]
    fn test_clear_closed() {
        let detection = classify(&score(0.20, 0.8), &score(0.95, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Closed);
        assert_eq!(detection.confidence, 0.95);
    }

    #[test]
    fn test_close_scores_tie_break_to_open() {
        let detection = classify(&score(0.82, 0.8), &score(0.80, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Open);
    }

    #[test]
    fn test_close_scores_tie_break_to_closed() {
        let detection = classify(&score(0.79, 0.8), &score(0.81, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Closed);
    }

    #[test]
    fn test_large_gap_without_position_is_not_decisive() {
        // Open wins by a wide margin but stays under its own threshold
        let detection = classify(&score(0.60, 0.8), &score(0.10, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Unknown);
        assert_eq!(detection.position, None);
    }

    #[test]
    fn test_both_low_is_unknown() {
        let detection = classify(&score(0.41, 0.8), &score(0.40, 0.8), 0.05);
        assert!(detection.is_unknown());
        assert_eq!(detection.confidence, 0.41);
    }

    #[test]
    fn test_absent_reference_scores_zero() {
        let detection = classify(&ReferenceScore::absent(0.8), &score(0.9, 0.8), 0.05);
        assert_eq!(detection.state, NodeState::Closed);
        assert_eq!(detection.open_confidence, 0.0);
    }
}
