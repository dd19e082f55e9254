use std::path::PathBuf;

use thiserror::Error;

/// Library error type for pan-zoom operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A rectangle with zero width or height reached the aspect-fit transform.
    #[error("degenerate rectangle ({width} x {height})")]
    DegenerateRectangle { width: f64, height: f64 },

    /// The display surface reported an empty size.
    #[error("display surface has no area ({width} x {height})")]
    EmptySurface { width: f64, height: f64 },

    /// The presentation surface is lost; recoverable through the recovery loop.
    #[error("presentation surface lost")]
    SurfaceLost,

    /// The presentation surface could not be reset. Fatal.
    #[error("failed to reset presentation surface: {0}")]
    SurfaceResetFailed(String),

    /// The source image could not be read or decoded.
    #[error("failed to load image {}", path.display())]
    ImageLoadFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
