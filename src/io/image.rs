//! Image loading, canonical resizing and export

use crate::io::error::{Result, SoilError, file_system_error};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;

/// File extensions recognized as raster images when scanning directories
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Whether `path` has an image extension, ignoring case
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Name prefix for files derived from `source`: its stem plus its lowercased
/// extension, so that `a.jpg` and `a.png` never write to the same outputs
pub fn output_stem(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match source.extension() {
        Some(ext) => format!("{stem}_{}", ext.to_string_lossy().to_ascii_lowercase()),
        None => stem,
    }
}

/// Load an image from disk as 8-bit RGB, dropping any alpha channel
///
/// # Errors
///
/// Returns an image load error if the file cannot be opened or decoded
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path_buf = path.as_ref().to_path_buf();
    let img = image::open(&path_buf).map_err(|e| SoilError::ImageLoad {
        path: path_buf,
        source: e,
    })?;
    Ok(img.to_rgb8())
}

/// Resize to a `resolution` x `resolution` square, ignoring aspect ratio
///
/// Images already at that size are copied unchanged.
pub fn resize_to_canonical(image: &RgbImage, resolution: u32) -> RgbImage {
    if image.width() == resolution && image.height() == resolution {
        return image.clone();
    }
    imageops::resize(image, resolution, resolution, FilterType::Triangle)
}

/// Save an RGB image, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_rgb<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| file_system_error(parent, "create directory", e))?;
    }

    image.save(path).map_err(|e| SoilError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
