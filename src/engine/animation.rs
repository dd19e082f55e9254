//! Linear interpolation of the visible rectangle between two keyframes.

use tracing::{debug, warn};

use crate::engine::picker::Keyframes;
use crate::processing::layout::{FitMode, fit_to_surface};
use crate::processing::rect::{Rect, Size};

/// Seconds a run takes to travel from the start to the end keyframe at 1.0x speed.
pub const ANIMATION_DURATION_SECS: f64 = 30.0;

/// Per-second rate of change of each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeDeltas {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeDeltas {
    fn between(from: Rect, to: Rect, duration: f64) -> Self {
        Self {
            top: (to.top - from.top) / duration,
            left: (to.left - from.left) / duration,
            bottom: (to.bottom - from.bottom) / duration,
            right: (to.right - from.right) / duration,
        }
    }

    fn apply(&self, rect: &mut Rect, seconds: f64) {
        rect.top += self.top * seconds;
        rect.left += self.left * seconds;
        rect.bottom += self.bottom * seconds;
        rect.right += self.right * seconds;
    }
}

/// Bookkeeping for the current run. `initialized == false` means the deltas
/// are stale and must be recomputed from the keyframes before moving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Scaled seconds accumulated since the run was initialized.
    pub elapsed_baseline: f64,
    pub duration: f64,
    pub initialized: bool,
    pub deltas: EdgeDeltas,
    /// Keyframes after fitting to the surface aspect ratio.
    pub effective_start: Rect,
    pub effective_end: Rect,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            elapsed_baseline: 0.0,
            duration: ANIMATION_DURATION_SECS,
            initialized: false,
            deltas: EdgeDeltas::default(),
            effective_start: Rect::new(0.0, 0.0, 0.0, 0.0),
            effective_end: Rect::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Inputs that define where a run goes.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints {
    pub keyframes: Keyframes,
    pub surface: Size,
    /// Substituted for a keyframe that has no area.
    pub fallback: Rect,
}

/// Owns the visible rectangle and advances it while the trigger is held.
#[derive(Debug, Clone)]
pub struct Animator {
    state: AnimationState,
    visible: Rect,
}

impl Animator {
    pub fn new(visible: Rect) -> Self {
        Self {
            state: AnimationState::default(),
            visible,
        }
    }

    pub fn visible(&self) -> Rect {
        self.visible
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Forces the next triggered tick to recompute the run from the keyframes.
    pub fn invalidate(&mut self) {
        self.state.initialized = false;
    }

    /// Replaces the visible rectangle without touching the run.
    pub fn show(&mut self, rect: Rect) {
        self.visible = rect;
    }

    /// Advances one tick and returns the visible rectangle.
    ///
    /// With the trigger released the rectangle is frozen and the run resets. On
    /// the first triggered tick the run is initialized and the rectangle jumps
    /// to the fitted start keyframe; later ticks move every edge by
    /// `delta * elapsed * speed`. Holding the trigger past the run's duration
    /// keeps moving past the end keyframe.
    pub fn advance(
        &mut self,
        trigger_active: bool,
        elapsed_seconds: f64,
        speed_multiplier: f64,
        endpoints: &Endpoints,
    ) -> Rect {
        if !trigger_active {
            self.state.initialized = false;
            return self.visible;
        }

        if !self.state.initialized {
            self.start_run(endpoints);
            return self.visible;
        }

        let scaled = elapsed_seconds * speed_multiplier;
        self.state.deltas.apply(&mut self.visible, scaled);
        self.state.elapsed_baseline += scaled;
        self.visible
    }

    fn start_run(&mut self, endpoints: &Endpoints) {
        let start = effective_endpoint(endpoints.keyframes.start, endpoints, "start");
        let end = effective_endpoint(endpoints.keyframes.end, endpoints, "end");
        let duration = self.state.duration;
        self.state = AnimationState {
            elapsed_baseline: 0.0,
            duration,
            initialized: true,
            deltas: EdgeDeltas::between(start, end, duration),
            effective_start: start,
            effective_end: end,
        };
        self.visible = start;
        debug!(?start, ?end, duration, "animation run initialized");
    }
}

fn effective_endpoint(rect: Rect, endpoints: &Endpoints, which: &'static str) -> Rect {
    match fit_to_surface(rect, endpoints.surface, FitMode::ContainSurfaceInRect) {
        Ok(fitted) => fitted.rect,
        Err(err) => {
            warn!(keyframe = which, error = %err, "keyframe unusable; using full image");
            fit_to_surface(endpoints.fallback, endpoints.surface, FitMode::ContainSurfaceInRect)
                .map(|fitted| fitted.rect)
                .unwrap_or(endpoints.fallback)
        }
    }
}
