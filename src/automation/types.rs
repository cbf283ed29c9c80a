// Types and enums for node traversal
use crate::device::{CaptureError, InputError, Position};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeState {
    Open,
    Closed,
    Unknown,
}

/// Outcome of one open/closed classification. Never cached: the UI can change
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeDetection {
    pub state: NodeState,
    pub position: Option<Position>,
    /// Confidence of the deciding reference (1.0 by convention when assumed)
    pub confidence: f32,
    pub open_confidence: f32,
    pub close_confidence: f32,
    /// Set when the state is a fallback guess rather than a detection
    pub assumed: bool,
}

impl NodeDetection {
    pub fn unknown(open_confidence: f32, close_confidence: f32) -> Self {
        Self {
            state: NodeState::Unknown,
            position: None,
            confidence: open_confidence.max(close_confidence),
            open_confidence,
            close_confidence,
            assumed: false,
        }
    }

    /// Fallback guess used when detection stays ambiguous after recovery
    pub fn assumed_open(position: Position, previous: &NodeDetection) -> Self {
        Self {
            state: NodeState::Open,
            position: Some(position),
            confidence: 1.0,
            open_confidence: previous.open_confidence,
            close_confidence: previous.close_confidence,
            assumed: true,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.state == NodeState::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraversalState {
    Idle,
    PrepareView,
    LocateParent,
    DetectState,
    Activate,
    EnumerateChildren,
    ActionChain(usize),
    Done,
    Aborted,
}

/// How the vertical offset of the next child is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressingMode {
    /// Offset is `index + 1`
    Direct,
    /// Scrolling works; offset cycles within the visible page
    Paginated,
    /// Scrolling failed; offset keeps incrementing from the last direct row
    PostScrollOffset,
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalReport {
    pub final_state: TraversalState,
    /// True when at least one child chain succeeded
    pub success: bool,
    pub children_visited: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub parent: Option<NodeDetection>,
    /// User-facing reason when the run aborted
    pub message: Option<String>,
}

/// Why one child's action chain failed. Counted toward the failure budget, never
/// fatal by itself.
#[derive(Debug, Error)]
pub enum ChainFailure {
    #[error("'{template}' not visible")]
    TemplateNotFound { template: String },

    #[error("input failed: {0}")]
    Input(#[from] InputError),

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("select-all was rejected")]
    SelectAllRejected,
}
