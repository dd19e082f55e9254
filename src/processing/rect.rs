//! Plain geometry values shared by the transform, the picker and the renderer.
//!
//! All rectangles live in image space (pixels, origin at the image's top-left).
//! Edges are stored as given: `top > bottom` or `left > right` is allowed while
//! the user is still picking corners, so width and height may be negative.

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    /// True when either dimension is zero, negative or not finite.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Rectangle described by its four edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Rectangle covering `size` with its origin at (0, 0).
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.height, size.width)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }

    /// Sets the top-left corner to image point (`x`, `y`).
    pub fn set_top_left(&mut self, x: f64, y: f64) {
        self.left = x;
        self.top = y;
    }

    /// Sets the bottom-right corner to image point (`x`, `y`).
    pub fn set_bottom_right(&mut self, x: f64, y: f64) {
        self.right = x;
        self.bottom = y;
    }

    /// Whether `other` lies inside `self` (edges may touch), allowing `eps` slack.
    pub fn contains(&self, other: &Rect, eps: f64) -> bool {
        other.left >= self.left - eps
            && other.top >= self.top - eps
            && other.right <= self.right + eps
            && other.bottom <= self.bottom + eps
    }

    /// Normalized texture coordinates of this rectangle over an image of `image` size.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_uv(&self, image: Size) -> UvRect {
        UvRect {
            u0: (self.left / image.width) as f32,
            v0: (self.top / image.height) as f32,
            u1: (self.right / image.width) as f32,
            v1: (self.bottom / image.height) as f32,
        }
    }
}

/// Texture coordinates for the top-left (`u0`, `v0`) and bottom-right (`u1`, `v1`)
/// corners of the displayed quad. Values outside `0..=1` fall in letterbox bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    pub fn as_array(&self) -> [f32; 4] {
        [self.u0, self.v0, self.u1, self.v1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_of_full_image_is_unit_square() {
        let image = Size::new(4000.0, 3000.0);
        assert_eq!(Rect::from_size(image).to_uv(image), UvRect::FULL);
    }

    #[test]
    fn uv_of_letterboxed_rect_extends_past_unit_range() {
        let image = Size::new(1000.0, 1000.0);
        let rect = Rect::new(0.0, -500.0, 1000.0, 1500.0);
        let uv = rect.to_uv(image);
        assert_eq!(uv.as_array(), [-0.5, 0.0, 1.5, 1.0]);
    }

    #[test]
    fn inverted_corners_give_negative_extent() {
        let mut rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        rect.set_top_left(20.0, 30.0);
        assert_eq!(rect.width(), -10.0);
        assert_eq!(rect.height(), -20.0);
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::new(0.0, 10.0).is_empty());
        assert!(Size::new(10.0, f64::NAN).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }
}
