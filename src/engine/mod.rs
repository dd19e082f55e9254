//! Viewport engine: keyframe picking and the pan-zoom animation, one tick at a time.
//!
//! The engine owns the keyframes, the visible rectangle and the animation run.
//! It never talks to the platform directly; each tick receives an
//! [`InputSnapshot`] and returns a [`FrameOutput`] for the renderer.

pub mod animation;
pub mod clock;
pub mod picker;
pub mod recovery;

use tracing::{debug, warn};

use crate::error::Error;
use crate::events::{FrameOutput, InputSnapshot};
use crate::processing::layout::ImageMapping;
use crate::processing::rect::{Rect, Size};

use animation::{AnimationState, Animator, Endpoints};
use picker::{Keyframes, pick_corners};

pub struct Engine {
    image: Size,
    surface: Size,
    keyframes: Keyframes,
    animator: Animator,
    mapping: ImageMapping,
    speed_presets: Vec<f64>,
}

impl Engine {
    /// Creates an engine showing the whole image letterboxed into `surface`.
    ///
    /// The start keyframe covers the full image and the end keyframe covers the
    /// top-left `surface`-sized region of it.
    pub fn new(image: Size, surface: Size, speed_presets: Vec<f64>) -> Result<Self, Error> {
        if image.is_empty() {
            return Err(Error::DegenerateRectangle {
                width: image.width,
                height: image.height,
            });
        }
        let mapping = ImageMapping::letterbox(image, surface)?;
        Ok(Self {
            image,
            surface,
            keyframes: Keyframes {
                start: Rect::from_size(image),
                end: Rect::from_size(surface),
            },
            animator: Animator::new(mapping.bounds),
            mapping,
            speed_presets,
        })
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn surface_size(&self) -> Size {
        self.surface
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }

    pub fn set_keyframes(&mut self, keyframes: Keyframes) {
        self.keyframes = keyframes;
        self.animator.invalidate();
    }

    pub fn visible(&self) -> Rect {
        self.animator.visible()
    }

    pub fn animation(&self) -> &AnimationState {
        self.animator.state()
    }

    pub fn mapping(&self) -> &ImageMapping {
        &self.mapping
    }

    /// Adopts a new surface size. An empty size (minimized window) is ignored.
    pub fn set_surface_size(&mut self, surface: Size) {
        if surface.is_empty() || surface == self.surface {
            return;
        }
        match ImageMapping::letterbox(self.image, surface) {
            Ok(mapping) => {
                debug!(width = surface.width, height = surface.height, "engine surface resized");
                self.surface = surface;
                self.mapping = mapping;
                self.animator.invalidate();
            }
            Err(err) => warn!(error = %err, "ignoring surface resize"),
        }
    }

    /// Multiplier for the preset at `selector`; 1.0 when none is selected.
    pub fn speed_multiplier(&self, selector: Option<usize>) -> f64 {
        selector
            .and_then(|idx| self.speed_presets.get(idx).copied())
            .unwrap_or(1.0)
    }

    /// Runs one tick: advance the animation, show the whole image while picking,
    /// then apply any committed corner picks.
    pub fn tick(&mut self, input: &InputSnapshot) -> FrameOutput {
        // Both are always valid here: image and surface were checked on entry.
        if let Ok(mapping) = ImageMapping::letterbox(self.image, self.surface) {
            self.mapping = mapping;
        }

        let speed = self.speed_multiplier(input.speed_selector);
        let endpoints = Endpoints {
            keyframes: self.keyframes,
            surface: self.surface,
            fallback: Rect::from_size(self.image),
        };
        self.animator
            .advance(input.trigger, input.elapsed_seconds, speed, &endpoints);

        // Picking happens against the whole image; the next triggered tick starts a fresh run.
        if input.arms.any() {
            self.animator.show(self.mapping.bounds);
            self.animator.invalidate();
        }

        let outcome = pick_corners(input, &self.mapping, &mut self.keyframes);
        if outcome.committed() {
            self.animator.invalidate();
            debug!(
                corners = outcome.count(),
                start = ?self.keyframes.start,
                end = ?self.keyframes.end,
                "keyframes updated"
            );
        }

        let visible = self.animator.visible();
        FrameOutput {
            visible,
            uv: visible.to_uv(self.image),
            picked: outcome.committed(),
        }
    }
}
