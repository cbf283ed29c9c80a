// Finite State Machine driving one traversal run
use super::context::AutomationContext;
use super::error::{AutomationError, AutomationResult};
use super::node_state::NodeStateDetector;
use super::session::{ChildLayout, TraversalSession};
use super::types::{ChainFailure, NodeDetection, NodeState, TraversalReport, TraversalState};
use crate::config::TraversalMode;
use crate::device::{
    Capture, CaptureRegion, CaptureResult, Frame, InputDispatcher, InputResult, Position,
    ScrollDirection, WindowManager,
};
use crate::template_matching::MatchResult;
use crate::template_matching::debug::save_debug_match;
use crate::templates::{FILTER_ICON, GRID_CHECK, GRID_MENU_OPTION, Template};
use std::path::Path;
use std::time::Duration;

/// Where match visualizations go when `debug_mode` is on
const DEBUG_DIR: &str = "debug_matches";

/// Block for a configured number of seconds; zero skips the sleep
fn pause(seconds: f64) {
    if seconds > 0.0 {
        std::thread::sleep(Duration::from_secs_f64(seconds));
    }
}

pub struct TraversalController<'a, C, I, W> {
    context: &'a AutomationContext,
    capture: C,
    input: I,
    window: W,
    state: TraversalState,
    region: Option<CaptureRegion>,
    last_click: Option<Position>,
}

impl<'a, C, I, W> TraversalController<'a, C, I, W>
where
    C: Capture,
    I: InputDispatcher,
    W: WindowManager,
{
    pub fn new(context: &'a AutomationContext, capture: C, input: I, window: W) -> Self {
        Self {
            context,
            capture,
            input,
            window,
            state: TraversalState::Idle,
            region: None,
            last_click: None,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn into_parts(self) -> (C, I, W) {
        (self.capture, self.input, self.window)
    }

    fn change_state(&mut self, new_state: TraversalState) {
        if self.state != new_state {
            log::info!("🎮 Traversal state: {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
        }
    }

    /// Run the whole traversal. Aborts are reported, not returned as errors.
    pub fn run(&mut self) -> TraversalReport {
        let mut session = TraversalSession::new(ChildLayout::from_config(&self.context.config));
        let mut parent = None;

        let outcome = self.execute(&mut session, &mut parent);
        let message = match outcome {
            Ok(()) => {
                self.change_state(TraversalState::Done);
                None
            }
            Err(e) => {
                log::error!("❌ Traversal aborted: {}", e);
                self.change_state(TraversalState::Aborted);
                Some(e.to_string())
            }
        };

        let report = TraversalReport {
            final_state: self.state,
            success: session.success(),
            children_visited: session.child_index,
            success_count: session.success_count,
            failure_count: session.failure_count,
            parent,
            message,
        };
        log::info!(
            "🏁 Traversal finished: {} succeeded, {} failed, {} visited",
            report.success_count,
            report.failure_count,
            report.children_visited
        );
        report
    }

    fn execute(
        &mut self,
        session: &mut TraversalSession,
        parent: &mut Option<NodeDetection>,
    ) -> AutomationResult<()> {
        self.context.check_required_templates()?;
        self.attach_window();

        self.change_state(TraversalState::PrepareView);
        self.prepare_view()?;

        self.change_state(TraversalState::LocateParent);
        let frame = self.take_frame()?;

        self.change_state(TraversalState::DetectState);
        let detection = self.detect_parent(&frame)?;
        *parent = Some(detection);
        let position = match (detection.state, detection.position) {
            (NodeState::Open | NodeState::Closed, Some(position)) => position,
            _ => return Err(AutomationError::UnknownParentState),
        };
        if detection.assumed {
            log::warn!("⚠️ Continuing with an assumed-open parent at {}", position);
        }

        if detection.state == NodeState::Closed {
            self.change_state(TraversalState::Activate);
            self.click(position)?;
            log::info!("📂 Opened parent node at {}", position);
            pause(self.context.config.operation_delay);
        }

        self.change_state(TraversalState::EnumerateChildren);
        match self.context.config.traversal_mode {
            TraversalMode::SinglePass => self.single_pass(session, position),
            TraversalMode::FullWalk => self.full_walk(session, position),
            TraversalMode::PerChild => self.per_child(session),
        }
        Ok(())
    }

    fn attach_window(&mut self) {
        if !self.window.ensure_active() {
            log::warn!(
                "⚠️ Could not activate a window titled {:?}",
                self.context.config.window_titles
            );
        }
        self.region = match self.window.locate() {
            Some(info) => {
                log::info!("🪟 Target window '{}' at {:?}", info.title, info.region);
                info.region
            }
            None => {
                log::warn!("⚠️ Target window not found, capturing the full screen");
                None
            }
        };
    }

    fn prepare_view(&mut self) -> AutomationResult<()> {
        self.click_required(FILTER_ICON)?;
        pause(self.context.config.menu_delay);
        self.click_required(GRID_MENU_OPTION)?;
        pause(self.context.config.operation_delay);
        Ok(())
    }

    fn detect_parent(&mut self, frame: &Frame) -> CaptureResult<NodeDetection> {
        let anchor = self.last_click.unwrap_or_else(|| frame.center());
        NodeStateDetector::new(self.context).detect_with_recovery(
            frame,
            &mut self.capture,
            &mut self.input,
            self.region.as_ref(),
            anchor,
        )
    }

    fn take_frame(&mut self) -> CaptureResult<Frame> {
        self.capture.take(self.region.as_ref())
    }

    fn click(&mut self, position: Position) -> InputResult<Position> {
        let clicked = self
            .input
            .click_at(position.x, position.y, self.region.as_ref())?;
        self.last_click = Some(clicked);
        pause(self.context.config.click_delay);
        Ok(clicked)
    }

    /// Run the matcher, saving a visualization when debugging
    fn locate(&self, frame: &Frame, template: &Template) -> Option<MatchResult> {
        let found = self.context.matcher.find(frame, template)?;
        if self.context.config.debug_mode {
            let dir = Path::new(DEBUG_DIR);
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::warn!("⚠️ Cannot create {:?}: {}", dir, e);
            } else if let Err(e) = save_debug_match(frame, template, &found, dir) {
                log::warn!("⚠️ Failed to save match visualization: {}", e);
            }
        }
        Some(found)
    }

    /// Find a template on a fresh frame and click it. `Ok(None)` when not visible.
    fn find_and_click(&mut self, template: &Template) -> Result<Option<Position>, ChainFailure> {
        let frame = self.take_frame()?;
        match self.locate(&frame, template) {
            Some(found) => Ok(Some(self.click(found.position)?)),
            None => Ok(None),
        }
    }

    /// Click a template whose absence aborts the run
    fn click_required(&mut self, name: &str) -> AutomationResult<Position> {
        let context = self.context;
        let template = context
            .templates
            .get(name)
            .ok_or_else(|| AutomationError::MissingTemplates {
                names: vec![name.to_string()],
                dir: context.templates.dir().to_path_buf(),
            })?;

        let frame = self.take_frame()?;
        let found = self
            .locate(&frame, template)
            .ok_or_else(|| AutomationError::StageFailed {
                stage: "prepare view",
                reason: format!("'{name}' is not visible"),
            })?;
        Ok(self.click(found.position)?)
    }

    /// Run the configured chain steps after a child has been selected
    fn run_chain_steps(&mut self) -> Result<(), ChainFailure> {
        let context = self.context;
        for step in &context.config.chain_steps {
            let Some(template) = context.templates.get(&step.template) else {
                if step.optional {
                    log::debug!("⏭️ Optional step '{}' has no template, skipping", step.template);
                    continue;
                }
                return Err(ChainFailure::TemplateNotFound {
                    template: step.template.clone(),
                });
            };

            match self.find_and_click(template)? {
                Some(position) => log::debug!("🔗 Step '{}' clicked at {}", step.template, position),
                None if step.optional => {
                    log::info!("⏭️ Optional step '{}' not visible, skipping", step.template)
                }
                None => {
                    return Err(ChainFailure::TemplateNotFound {
                        template: step.template.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn record_chain(&mut self, session: &mut TraversalSession, result: Result<(), ChainFailure>) {
        let index = session.child_index;
        match result {
            Ok(()) => {
                session.record_success();
                log::info!("✅ Child {} done", index);
            }
            Err(e) => {
                session.record_failure();
                log::warn!(
                    "⚠️ Child {} failed: {} ({} consecutive)",
                    index,
                    e,
                    session.consecutive_failures
                );
            }
        }
        session.child_index += 1;
        self.change_state(TraversalState::EnumerateChildren);
    }

    fn limit_reached(&self, session: &TraversalSession, budget: usize) -> bool {
        if session.budget_exhausted(budget) {
            log::info!(
                "🛑 {} consecutive failures, stopping enumeration",
                session.consecutive_failures
            );
            return true;
        }
        if let Some(max) = self.context.config.max_children
            && session.child_index >= max
        {
            log::info!("🛑 Reached max_children ({})", max);
            return true;
        }
        false
    }

    fn single_pass(&mut self, session: &mut TraversalSession, parent: Position) {
        let offset = self.context.config.single_pass_child_offset;
        let child = Position::new(parent.x, session.layout().row_y(parent.y, offset));
        self.change_state(TraversalState::ActionChain(0));

        let result = self.single_pass_chain(child);
        self.record_chain(session, result);
    }

    fn single_pass_chain(&mut self, child: Position) -> Result<(), ChainFailure> {
        self.click(child)?;
        if !self.input.select_all() {
            return Err(ChainFailure::SelectAllRejected);
        }
        pause(self.context.config.operation_delay);

        let context = self.context;
        let template = context
            .templates
            .get(GRID_CHECK)
            .ok_or_else(|| ChainFailure::TemplateNotFound {
                template: GRID_CHECK.to_string(),
            })?;
        match self.find_and_click(template)? {
            Some(_) => Ok(()),
            None => Err(ChainFailure::TemplateNotFound {
                template: GRID_CHECK.to_string(),
            }),
        }
    }

    fn full_walk(&mut self, session: &mut TraversalSession, parent: Position) {
        let budget = self.context.config.failure_budget();
        while !self.limit_reached(session, budget) {
            let index = session.child_index;
            if session.needs_scroll(index) {
                let scrolled = self.input.scroll(
                    ScrollDirection::Down,
                    parent.x,
                    parent.y,
                    self.region.as_ref(),
                );
                session.record_scroll(scrolled);
                if scrolled {
                    pause(self.context.config.operation_delay);
                }
            }

            let child = Position::new(parent.x, session.child_y(parent.y, index));
            log::debug!(
                "👶 Child {} at {} ({:?})",
                index,
                child,
                session.addressing_mode
            );
            self.change_state(TraversalState::ActionChain(index));

            let result = self
                .click(child)
                .map_err(ChainFailure::from)
                .and_then(|_| self.run_chain_steps());
            self.record_chain(session, result);
            pause(self.context.config.operation_delay);
        }
    }

    fn per_child(&mut self, session: &mut TraversalSession) {
        let context = self.context;
        let budget = context.config.failure_budget();
        for name in &context.config.child_templates {
            if self.limit_reached(session, budget) {
                break;
            }
            let Some(template) = context.templates.get(name) else {
                log::warn!("⚠️ No template for child '{}', skipping", name);
                continue;
            };

            self.change_state(TraversalState::ActionChain(session.child_index));
            let result = self.named_child_chain(template);
            self.record_chain(session, result);
            pause(context.config.operation_delay);
        }
    }

    fn named_child_chain(&mut self, template: &Template) -> Result<(), ChainFailure> {
        match self.find_and_click(template)? {
            Some(_) => self.run_chain_steps(),
            None => Err(ChainFailure::TemplateNotFound {
                template: template.name.clone(),
            }),
        }
    }
}
