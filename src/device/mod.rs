// Device boundary: the capture, input and window capabilities the automation consumes.
// Live OS backends implement these traits; the replay module provides offline ones.

pub mod error;
pub mod replay;
pub mod types;


pub use error::{CaptureError, CaptureResult, InputError, InputResult};
pub use replay::{RecordedAction, RecordingDispatcher, ReplayCapture, StaticWindow};
pub use types::{
    Capture, CaptureRegion, Frame, InputDispatcher, Position, ScrollDirection, WindowInfo,
    WindowManager,
};
