//! Native "open image" dialog used when no image is given on the command line.

use std::path::PathBuf;

use tracing::{debug, info};

/// Extensions offered by the dialog; the decoder supports each of these.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Blocks on a native file dialog. `None` means the user cancelled.
pub fn pick_image() -> Option<PathBuf> {
    let picked = rfd::FileDialog::new()
        .set_title("Select Image File")
        .add_filter("Image Files", &IMAGE_EXTENSIONS)
        .pick_file();
    match picked.as_ref() {
        Some(path) => info!(path = %path.display(), "image selected"),
        None => debug!("image selection cancelled"),
    }
    picked
}

/// True when `path` carries one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn has_image_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
