pub mod args;
pub mod automation;
pub mod config;
pub mod device;
pub mod template_matching;
pub mod templates;

#[cfg(test)]
mod test_support;

pub use automation::{AutomationContext, TraversalController, TraversalReport};
pub use config::AutomationConfig;
pub use template_matching::TemplateMatcher;
