//! Offline collaborators: replay recorded screenshots, record input instead of injecting it.
//!
//! These drive the decision layer without a live desktop, for dry runs from the CLI
//! and for tests.

use super::error::{CaptureError, CaptureResult, InputError, InputResult};
use super::types::{
    Capture, CaptureRegion, Frame, InputDispatcher, Position, ScrollDirection, WindowInfo,
    WindowManager,
};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

enum FrameSource {
    Memory(Frame),
    File(PathBuf),
}

/// Capture that hands out a fixed sequence of frames, repeating the last one.
pub struct ReplayCapture {
    sources: VecDeque<FrameSource>,
    failing_calls: HashSet<usize>,
    calls: usize,
}

impl ReplayCapture {
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            sources: frames.into_iter().map(FrameSource::Memory).collect(),
            failing_calls: HashSet::new(),
            calls: 0,
        }
    }

    /// Replay screenshots from disk, decoded lazily on each take
    pub fn from_files(paths: Vec<PathBuf>) -> Self {
        Self {
            sources: paths.into_iter().map(FrameSource::File).collect(),
            failing_calls: HashSet::new(),
            calls: 0,
        }
    }

    /// Make the n-th call (zero-based) fail with `CaptureError::Unavailable`
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    /// Number of take() calls so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Region covering the first recorded frame. Used as the window region so clicks
    /// past the edge of the recording are rejected instead of landing nowhere.
    pub fn bounds(&self) -> CaptureResult<CaptureRegion> {
        let frame = Self::load(self.sources.front().ok_or(CaptureError::Exhausted)?)?;
        Ok(CaptureRegion::new(0, 0, frame.width(), frame.height()))
    }

    fn load(source: &FrameSource) -> CaptureResult<Frame> {
        match source {
            FrameSource::Memory(frame) => Ok(frame.clone()),
            FrameSource::File(path) => {
                let image = image::open(path)
                    .map_err(|source| CaptureError::ReadFailed {
                        path: path.clone(),
                        source,
                    })?
                    .to_rgb8();
                Ok(Frame::new(image, None))
            }
        }
    }
}

impl Capture for ReplayCapture {
    fn take(&mut self, region: Option<&CaptureRegion>) -> CaptureResult<Frame> {
        let call = self.calls;
        self.calls += 1;

        if self.failing_calls.contains(&call) {
            return Err(CaptureError::Unavailable {
                description: format!("scripted failure on capture #{call}"),
            });
        }
        if let Some(r) = region
            && !r.is_valid()
        {
            return Err(CaptureError::EmptyRegion {
                width: r.width,
                height: r.height,
            });
        }

        let source = if self.sources.len() > 1 {
            self.sources.pop_front()
        } else {
            None
        };
        let mut frame = match &source {
            Some(s) => Self::load(s)?,
            None => Self::load(self.sources.front().ok_or(CaptureError::Exhausted)?)?,
        };
        if frame.region.is_none() {
            frame.region = region.copied();
        }
        log::debug!(
            "📸 Replay capture #{} ({}x{})",
            call,
            frame.width(),
            frame.height()
        );
        Ok(frame)
    }
}

/// An input action observed by the recording dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedAction {
    Click(Position),
    Scroll(ScrollDirection, Position),
    SelectAll,
}

/// Input dispatcher that records actions instead of injecting them.
pub struct RecordingDispatcher {
    actions: Vec<RecordedAction>,
    scroll_script: VecDeque<bool>,
    scroll_default: bool,
    failing_clicks: HashSet<usize>,
    clicks: usize,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            scroll_script: VecDeque::new(),
            scroll_default: true,
            failing_clicks: HashSet::new(),
            clicks: 0,
        }
    }

    /// Outcome of every scroll once the script is used up
    pub fn with_scroll_default(mut self, succeed: bool) -> Self {
        self.scroll_default = succeed;
        self
    }

    /// Outcomes of the next scroll calls, in order
    pub fn with_scroll_script(mut self, outcomes: &[bool]) -> Self {
        self.scroll_script = outcomes.iter().copied().collect();
        self
    }

    /// Make the n-th click (zero-based) fail
    pub fn fail_click(mut self, click: usize) -> Self {
        self.failing_clicks.insert(click);
        self
    }

    pub fn actions(&self) -> &[RecordedAction] {
        &self.actions
    }

    pub fn clicks(&self) -> Vec<Position> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                RecordedAction::Click(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> Vec<(ScrollDirection, Position)> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                RecordedAction::Scroll(d, p) => Some((*d, *p)),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDispatcher for RecordingDispatcher {
    fn click_at(&mut self, x: i32, y: i32, region: Option<&CaptureRegion>) -> InputResult<Position> {
        let click = self.clicks;
        self.clicks += 1;

        if let Some(r) = region
            && !r.contains_point(x, y)
        {
            return Err(InputError::OutOfBounds { x, y });
        }
        if self.failing_clicks.contains(&click) {
            return Err(InputError::Rejected {
                description: format!("scripted failure on click #{click}"),
            });
        }

        let position = Position::new(x, y);
        log::info!("🖱️ Click at {}", position);
        self.actions.push(RecordedAction::Click(position));
        Ok(position)
    }

    fn scroll(
        &mut self,
        direction: ScrollDirection,
        x: i32,
        y: i32,
        _region: Option<&CaptureRegion>,
    ) -> bool {
        let position = Position::new(x, y);
        self.actions
            .push(RecordedAction::Scroll(direction, position));
        let outcome = self.scroll_script.pop_front().unwrap_or(self.scroll_default);
        log::debug!("🖱️ Scroll {:?} at {} -> {}", direction, position, outcome);
        outcome
    }

    fn select_all(&mut self) -> bool {
        self.actions.push(RecordedAction::SelectAll);
        log::debug!("⌨️ Select-all");
        true
    }
}

/// Window manager for a fixed, already-visible window.
pub struct StaticWindow {
    info: Option<WindowInfo>,
    active: bool,
}

impl StaticWindow {
    pub fn new(title: &str, region: Option<CaptureRegion>) -> Self {
        Self {
            info: Some(WindowInfo {
                title: title.to_string(),
                app_name: None,
                region,
            }),
            active: true,
        }
    }

    /// A window manager that never finds the window; callers fall back to full screen
    pub fn missing() -> Self {
        Self {
            info: None,
            active: false,
        }
    }
}

impl WindowManager for StaticWindow {
    fn ensure_active(&mut self) -> bool {
        self.active
    }

    fn locate(&mut self) -> Option<WindowInfo> {
        self.info.clone()
    }
}
