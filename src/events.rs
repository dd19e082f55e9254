//! Per-tick values passed between input, engine and renderer.

use crate::processing::rect::{Rect, UvRect};

/// Pointer position in surface pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

/// Level-triggered arm signals, one per pickable corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CornerArms {
    pub start_top_left: bool,
    pub start_bottom_right: bool,
    pub end_top_left: bool,
    pub end_bottom_right: bool,
}

impl CornerArms {
    pub fn any(&self) -> bool {
        self.start_top_left || self.start_bottom_right || self.end_top_left || self.end_bottom_right
    }
}

/// Everything the engine reads from the platform for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub pointer: Pointer,
    pub arms: CornerArms,
    /// Pointer button held; corner picks only apply while it is down.
    pub commit: bool,
    /// Animation trigger held.
    pub trigger: bool,
    /// Index into the configured speed presets, if a preset key is held.
    pub speed_selector: Option<usize>,
    pub exit: bool,
    /// Wall-clock seconds since the previous tick.
    pub elapsed_seconds: f64,
}

/// What the renderer needs to draw a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    /// Visible rectangle in image space.
    pub visible: Rect,
    /// `visible` normalized against the image's natural size.
    pub uv: UvRect,
    /// A corner pick committed this tick; the renderer flashes the feedback colour.
    pub picked: bool,
}
