//! Image decoding for the renderer.
//! Applies EXIF orientation so the reported size matches what is drawn, and
//! shrinks images that exceed the device's texture limit.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;
use crate::processing::rect::Size;

/// An RGBA8 image ready for GPU upload.
pub struct PreparedImage {
    pub path: PathBuf,
    /// Natural (oriented) size; texture coordinates are relative to this.
    pub natural: (u32, u32),
    /// Uploaded dimensions, at most `max_dim` on each side.
    pub size: (u32, u32),
    pub pixels: Vec<u8>,
}

fn load_failed(path: &Path) -> impl FnOnce(image::ImageError) -> Error {
    move |source| Error::ImageLoadFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = u16::try_from(field.value.get_uint(0)?).ok()?;
    debug!("exif orientation {} for {}", o, path.display());
    Some(o)
}

/// Orientations 5-8 rotate by a quarter turn and swap width and height.
fn swaps_axes(orientation: u16) -> bool {
    matches!(orientation, 5..=8)
}

/// Natural pixel size of the image at `path`, after EXIF orientation.
pub fn image_size(path: &Path) -> Result<Size, Error> {
    let (w, h) = image::image_dimensions(path).map_err(load_failed(path))?;
    let orientation = read_orientation(path).unwrap_or(1);
    let (w, h) = if swaps_axes(orientation) { (h, w) } else { (w, h) };
    Ok(Size::from_pixels(w, h))
}

/// Decodes `path` to RGBA8 with orientation applied, downscaled to fit `max_dim`.
pub fn load_rgba(path: &Path, max_dim: u32) -> Result<PreparedImage, Error> {
    let img = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(load_failed(path))?;

    let img = match read_orientation(path).unwrap_or(1) {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    };

    let natural = (img.width(), img.height());
    let max_dim = max_dim.max(1);
    let img = if natural.0 > max_dim || natural.1 > max_dim {
        debug!(
            width = natural.0,
            height = natural.1,
            max_dim,
            "downscaling image for upload"
        );
        img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let size = rgba.dimensions();
    Ok(PreparedImage {
        path: path.to_path_buf(),
        natural,
        size,
        pixels: rgba.into_raw(),
    })
}
