// Node traversal: state detection, child addressing and the controller state machine
pub mod context;
pub mod error;
pub mod fsm;
pub mod node_state;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;

pub use context::AutomationContext;
pub use error::{AutomationError, AutomationResult};
pub use fsm::TraversalController;
pub use node_state::{NodeStateDetector, ReferenceScore, classify};
pub use session::{ChildLayout, TraversalSession};
pub use types::{
    AddressingMode, ChainFailure, NodeDetection, NodeState, TraversalReport, TraversalState,
};
