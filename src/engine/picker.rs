//! Interactive four-corner picking.
//!
//! Arm signals are sampled fresh every tick and are not mutually exclusive: one
//! click while two arm keys are held moves both corners. Holding an arm key and
//! the pointer button while dragging keeps moving the corner every tick.

use tracing::debug;

use crate::events::{CornerArms, InputSnapshot};
use crate::processing::layout::ImageMapping;
use crate::processing::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    StartTopLeft,
    StartBottomRight,
    EndTopLeft,
    EndBottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::StartTopLeft,
        Corner::StartBottomRight,
        Corner::EndTopLeft,
        Corner::EndBottomRight,
    ];

    pub fn is_armed(self, arms: &CornerArms) -> bool {
        match self {
            Corner::StartTopLeft => arms.start_top_left,
            Corner::StartBottomRight => arms.start_bottom_right,
            Corner::EndTopLeft => arms.end_top_left,
            Corner::EndBottomRight => arms.end_bottom_right,
        }
    }
}

/// The two user-defined rectangles an animation runs between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframes {
    pub start: Rect,
    pub end: Rect,
}

impl Keyframes {
    pub fn set_corner(&mut self, corner: Corner, x: f64, y: f64) {
        match corner {
            Corner::StartTopLeft => self.start.set_top_left(x, y),
            Corner::StartBottomRight => self.start.set_bottom_right(x, y),
            Corner::EndTopLeft => self.end.set_top_left(x, y),
            Corner::EndBottomRight => self.end.set_bottom_right(x, y),
        }
    }
}

/// Corners written by one call to [`pick_corners`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickOutcome {
    corners: [bool; 4],
}

impl PickOutcome {
    pub fn committed(&self) -> bool {
        self.corners.iter().any(|&set| set)
    }

    pub fn contains(&self, corner: Corner) -> bool {
        self.corners[corner as usize]
    }

    pub fn count(&self) -> usize {
        self.corners.iter().filter(|&&set| set).count()
    }
}

/// Writes the pointer's image-space position into every armed corner, provided
/// the commit signal is held. `mapping` must be the placement computed for the
/// current tick.
pub fn pick_corners(
    input: &InputSnapshot,
    mapping: &ImageMapping,
    keyframes: &mut Keyframes,
) -> PickOutcome {
    let mut outcome = PickOutcome::default();
    if !input.commit {
        return outcome;
    }
    let (x, y) = mapping.surface_to_image(input.pointer.x, input.pointer.y);
    for corner in Corner::ALL {
        if corner.is_armed(&input.arms) {
            keyframes.set_corner(corner, x, y);
            outcome.corners[corner as usize] = true;
            debug!(?corner, x, y, "corner picked");
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Pointer;
    use crate::processing::rect::Size;

    fn keyframes() -> Keyframes {
        Keyframes {
            start: Rect::new(0.0, 0.0, 2160.0, 3840.0),
            end: Rect::new(0.0, 0.0, 1080.0, 1920.0),
        }
    }

    fn mapping() -> ImageMapping {
        ImageMapping::letterbox(Size::new(3840.0, 2160.0), Size::new(1920.0, 1080.0)).unwrap()
    }

    fn input(x: f64, y: f64, arms: CornerArms, commit: bool) -> InputSnapshot {
        InputSnapshot {
            pointer: Pointer { x, y },
            arms,
            commit,
            ..InputSnapshot::default()
        }
    }

    #[test]
    fn arm_without_commit_does_nothing() {
        let mut kf = keyframes();
        let arms = CornerArms {
            start_top_left: true,
            ..CornerArms::default()
        };
        let outcome = pick_corners(&input(100.0, 100.0, arms, false), &mapping(), &mut kf);
        assert!(!outcome.committed());
        assert_eq!(kf, keyframes());
    }

    #[test]
    fn commit_without_arm_does_nothing() {
        let mut kf = keyframes();
        let outcome = pick_corners(
            &input(100.0, 100.0, CornerArms::default(), true),
            &mapping(),
            &mut kf,
        );
        assert!(!outcome.committed());
        assert_eq!(kf, keyframes());
    }

    #[test]
    fn end_bottom_right_maps_through_scale() {
        let mut kf = keyframes();
        let arms = CornerArms {
            end_bottom_right: true,
            ..CornerArms::default()
        };
        let outcome = pick_corners(&input(500.0, 250.0, arms, true), &mapping(), &mut kf);
        assert!(outcome.contains(Corner::EndBottomRight));
        assert_eq!(outcome.count(), 1);
        assert_eq!(kf.end, Rect::new(0.0, 0.0, 500.0, 1000.0));
        assert_eq!(kf.start, keyframes().start);
    }

    #[test]
    fn simultaneous_arms_all_fire() {
        let mut kf = keyframes();
        let arms = CornerArms {
            start_top_left: true,
            end_top_left: true,
            ..CornerArms::default()
        };
        let outcome = pick_corners(&input(10.0, 20.0, arms, true), &mapping(), &mut kf);
        assert_eq!(outcome.count(), 2);
        assert_eq!((kf.start.left, kf.start.top), (20.0, 40.0));
        assert_eq!((kf.end.left, kf.end.top), (20.0, 40.0));
    }
}
