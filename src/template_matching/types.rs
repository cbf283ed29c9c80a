//! Template matching data types

use crate::device::Position;
use serde::Serialize;

/// Similarity measure computed over every window of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMethod {
    /// Normalized cross-correlation
    CrossCorrelation,
    /// Normalized correlation coefficient (mean-subtracted)
    CorrelationCoefficient,
    /// Normalized squared difference, reported as `1 - value`
    SquaredDifference,
}

impl MatchMethod {
    /// Evaluation order of the multi-method stage; earlier wins ties
    pub const ALL: [MatchMethod; 3] = [
        MatchMethod::CrossCorrelation,
        MatchMethod::CorrelationCoefficient,
        MatchMethod::SquaredDifference,
    ];
}

/// Representation a preprocessed match was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Representation {
    Grayscale,
    Blurred,
    Equalized,
    Edges,
}

impl Representation {
    pub const ALL: [Representation; 4] = [
        Representation::Grayscale,
        Representation::Blurred,
        Representation::Equalized,
        Representation::Edges,
    ];
}

/// Pipeline stage that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MatchStrategy {
    Basic,
    MultiMethod,
    MultiScale,
    Preprocessed(Representation),
    Relaxed,
}

/// Best window of one measure, regardless of any threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    /// Centre of the matched footprint
    pub position: Position,
    /// Similarity (0.0-1.0)
    pub confidence: f32,
    pub method: MatchMethod,
}

/// An accepted match. Only built with `confidence >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// Centre of the matched footprint, in frame pixels
    pub position: Position,
    /// Similarity (0.0-1.0)
    pub confidence: f32,
    pub method: MatchMethod,
    pub strategy: MatchStrategy,
    /// Threshold this result was accepted against
    pub threshold: f32,
    /// Template scale of the match (1.0 unless multi-scale matched)
    pub scale: f32,
}

impl MatchResult {
    /// Accept a candidate if it clears `threshold`
    pub fn accept(
        candidate: Candidate,
        threshold: f32,
        strategy: MatchStrategy,
        scale: f32,
    ) -> Option<Self> {
        (candidate.confidence >= threshold).then_some(Self {
            position: candidate.position,
            confidence: candidate.confidence,
            method: candidate.method,
            strategy,
            threshold,
            scale,
        })
    }

    /// Format match as string with confidence percentage
    pub fn describe(&self, template_name: &str) -> String {
        format!(
            "{} at {} - {}% via {:?}/{:?}",
            template_name,
            self.position,
            (self.confidence * 100.0) as u32,
            self.strategy,
            self.method
        )
    }
}
