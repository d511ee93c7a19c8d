use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Path fragment marking a file that lives inside a zip archive.
const ARCHIVE_MARKER: &str = ".zip/";

/// The container format of an eligible image file.
///
/// JPEG files carry EXIF in APP1 and IPTC in APP13; TIFF files carry EXIF only
/// as far as this crate is concerned.
///
/// # Example
///
/// ```rust
/// use exif_meta::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("photo.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::from_path(Path::new("scan.tiff")), Some(ImageKind::Tiff));
/// assert_eq!(ImageKind::from_path(Path::new("image.png")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageKind {
    Jpeg,
    Tiff,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// Whether a location points inside an archive (`.../photos.zip/img.jpg`).
pub fn is_inside_archive(location: &str) -> bool {
    location.contains(ARCHIVE_MARKER)
}

/// Collect eligible image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only `jpg`, `jpeg`, `tif` and `tiff`
/// files are included.
///
/// # Example
///
/// ```rust,no_run
/// use exif_meta::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    ImageKind::from_path(path).is_some()
}
