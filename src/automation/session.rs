//! Per-enumeration bookkeeping: child addressing and the failure budget.

use super::types::AddressingMode;
use crate::config::AutomationConfig;
use serde::Serialize;

/// Row geometry below the parent node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildLayout {
    pub node_height: u32,
    pub display_scale: f64,
    /// Children addressed directly before pagination starts
    pub direct_children: usize,
    pub pagination_stride: usize,
    pub pagination_base_offset: usize,
}

impl ChildLayout {
    pub fn from_config(config: &AutomationConfig) -> Self {
        Self {
            node_height: config.node_height,
            display_scale: config.display_scale,
            direct_children: config.direct_children,
            pagination_stride: config.pagination_stride.max(1),
            pagination_base_offset: config.pagination_base_offset,
        }
    }

    /// Frame y of the row `offset` rows below `parent_y`
    pub fn row_y(&self, parent_y: i32, offset: usize) -> i32 {
        let step = self.node_height as f64 * self.display_scale;
        parent_y + (offset as f64 * step).round() as i32
    }
}

/// Mutable state of one child enumeration. Owned by the controller alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalSession {
    pub child_index: usize,
    pub consecutive_failures: usize,
    /// Last row offset handed out in `PostScrollOffset` mode
    pub scroll_offset: usize,
    pub addressing_mode: AddressingMode,
    pub success_count: usize,
    pub failure_count: usize,
    pub scroll_disabled: bool,
    #[serde(skip)]
    layout: ChildLayout,
}

impl TraversalSession {
    pub fn new(layout: ChildLayout) -> Self {
        Self {
            child_index: 0,
            consecutive_failures: 0,
            scroll_offset: 0,
            addressing_mode: AddressingMode::Direct,
            success_count: 0,
            failure_count: 0,
            scroll_disabled: false,
            layout,
        }
    }

    pub fn layout(&self) -> &ChildLayout {
        &self.layout
    }

    /// Whether a downward scroll must be attempted before addressing `index`
    pub fn needs_scroll(&self, index: usize) -> bool {
        let n = self.layout.direct_children;
        !self.scroll_disabled && index >= n && (index - n) % self.layout.pagination_stride == 0
    }

    /// Record the outcome of a pagination scroll. The first failure disables
    /// scrolling for the rest of the session.
    pub fn record_scroll(&mut self, succeeded: bool) {
        if succeeded {
            if self.addressing_mode == AddressingMode::Direct {
                log::info!("📜 Scrolling works, switching to paginated addressing");
            }
            self.addressing_mode = AddressingMode::Paginated;
        } else {
            log::warn!(
                "⚠️ Scroll failed at child {}, switching to incrementing offsets",
                self.child_index
            );
            self.addressing_mode = AddressingMode::PostScrollOffset;
            self.scroll_disabled = true;
            self.scroll_offset = self.layout.direct_children;
        }
    }

    /// Row offset (in node heights below the parent) of child `index`
    pub fn row_offset(&mut self, index: usize) -> usize {
        match self.addressing_mode {
            AddressingMode::Paginated if index >= self.layout.direct_children => {
                (index % self.layout.pagination_stride) + self.layout.pagination_base_offset
            }
            AddressingMode::PostScrollOffset if index >= self.layout.direct_children => {
                self.scroll_offset += 1;
                self.scroll_offset
            }
            _ => index + 1,
        }
    }

    /// Frame y of child `index`, advancing the post-scroll offset when in that mode
    pub fn child_y(&mut self, parent_y: i32, index: usize) -> i32 {
        let offset = self.row_offset(index);
        self.layout.row_y(parent_y, offset)
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.consecutive_failures += 1;
    }

    pub fn budget_exhausted(&self, budget: usize) -> bool {
        self.consecutive_failures >= budget
    }

    pub fn success(&self) -> bool {
        self.success_count > 0
    }
}
