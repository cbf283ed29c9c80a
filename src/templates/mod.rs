/// Reference images: loading, lookup and quality scoring
pub mod quality;
pub mod store;

pub use quality::{QualityLevel, TemplateQuality};
pub use store::{SemanticClass, Template, TemplateError, TemplateResult, TemplateStore};

/// Filter icon that opens the view options
pub const FILTER_ICON: &str = "img_filter_icon";
/// Menu entry that switches the tree to grid view
pub const GRID_MENU_OPTION: &str = "grid_menu_option";
/// Parent node in its closed state
pub const NODE_CLOSED: &str = "attachment_node";
/// Parent node in its expanded state
pub const NODE_OPEN: &str = "attachment_node_open";
/// Confirmation button of the single-pass mode
pub const GRID_CHECK: &str = "grid_check";
