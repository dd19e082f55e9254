//! Aspect-fit transform between image space and surface space.

use crate::error::Error;
use crate::processing::rect::{Rect, Size};

/// Smallest width or height a rectangle may have before it is treated as degenerate.
pub const MIN_EXTENT: f64 = 1e-6;

/// How a rectangle is reconciled with the aspect ratio of the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Grow the rectangle so all of it is visible on the surface (letterboxing).
    ContainRectInSurface,
    /// Shrink the rectangle so the surface is completely covered by it (cropping).
    ContainSurfaceInRect,
}

/// Rectangle adjusted to the surface aspect ratio plus its scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fitted {
    pub rect: Rect,
    /// Image pixels per surface pixel, identical along both axes.
    pub scale: f64,
}

/// Expands or contracts one pair of opposite edges of `rect` so that its aspect
/// ratio matches `surface`. The other pair is left untouched and the padding is
/// split evenly between the two moved edges.
pub fn fit_to_surface(rect: Rect, surface: Size, mode: FitMode) -> Result<Fitted, Error> {
    if surface.is_empty() {
        return Err(Error::EmptySurface {
            width: surface.width,
            height: surface.height,
        });
    }
    let width = rect.width();
    let height = rect.height();
    if !(width.is_finite() && height.is_finite())
        || width.abs() < MIN_EXTENT
        || height.abs() < MIN_EXTENT
    {
        return Err(Error::DegenerateRectangle { width, height });
    }

    let rect_aspect = width / height;
    let surface_aspect = surface.aspect();
    let pad_vertical = match mode {
        FitMode::ContainRectInSurface => rect_aspect > surface_aspect,
        FitMode::ContainSurfaceInRect => rect_aspect < surface_aspect,
    };

    // Cross products: integral inputs with matching aspect get exactly zero padding.
    let mut out = rect;
    let scale = if pad_vertical {
        let offset = (width * surface.height - height * surface.width) / (2.0 * surface.width);
        out.top -= offset;
        out.bottom += offset;
        width / surface.width
    } else {
        let offset = (height * surface.width - width * surface.height) / (2.0 * surface.height);
        out.left -= offset;
        out.right += offset;
        height / surface.height
    };

    Ok(Fitted { rect: out, scale })
}

/// Placement of the whole image on the surface, used to map pointer positions
/// to image coordinates and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMapping {
    /// The image rectangle after letterboxing; its top-left sits at surface (0, 0).
    pub bounds: Rect,
    pub scale: f64,
}

impl ImageMapping {
    /// Letterboxes the full `image` into `surface`.
    pub fn letterbox(image: Size, surface: Size) -> Result<Self, Error> {
        let Fitted { rect, scale } =
            fit_to_surface(Rect::from_size(image), surface, FitMode::ContainRectInSurface)?;
        Ok(Self {
            bounds: rect,
            scale,
        })
    }

    pub fn surface_to_image(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.bounds.left,
            y * self.scale + self.bounds.top,
        )
    }

    pub fn image_to_surface(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.bounds.left) / self.scale,
            (y - self.bounds.top) / self.scale,
        )
    }
}
