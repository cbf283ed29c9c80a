// Core capture/input types and the capability traits the automation drives
use super::error::{CaptureResult, InputResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Screen rectangle of the target window. Frame coordinates are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if this region contains a frame-relative point
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Translate a frame-relative point into absolute screen coordinates
    pub fn to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        (self.x + x, self.y + y)
    }

    /// Check if this region is valid (non-zero dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Frame-pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A captured image buffer. Owned by the operation that requested it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub region: Option<CaptureRegion>,
}

impl Frame {
    pub fn new(image: RgbImage, region: Option<CaptureRegion>) -> Self {
        Self { image, region }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Geometric centre of the frame
    pub fn center(&self) -> Position {
        Position::new((self.width() / 2) as i32, (self.height() / 2) as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Located application window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub title: String,
    pub app_name: Option<String>,
    pub region: Option<CaptureRegion>,
}

/// Screen capture capability.
pub trait Capture {
    fn take(&mut self, region: Option<&CaptureRegion>) -> CaptureResult<Frame>;
}

/// Mouse/keyboard injection capability. Coordinates are frame pixels;
/// implementations own the display-scale and region translation.
pub trait InputDispatcher {
    fn click_at(&mut self, x: i32, y: i32, region: Option<&CaptureRegion>) -> InputResult<Position>;
    fn scroll(
        &mut self,
        direction: ScrollDirection,
        x: i32,
        y: i32,
        region: Option<&CaptureRegion>,
    ) -> bool;
    /// Send the platform select-all shortcut to the focused widget
    fn select_all(&mut self) -> bool;
}

/// Window discovery and activation capability.
pub trait WindowManager {
    fn ensure_active(&mut self) -> bool;
    fn locate(&mut self) -> Option<WindowInfo>;
}
