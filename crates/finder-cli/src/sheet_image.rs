//! Sheet image I/O: loading, YOLO resizing, expedition reduction and label crops

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use label_finder_common::{Category, FinderError, Result};
use label_finder_reconcile::{BoundingBox, ImageSize};
use std::path::{Path, PathBuf};

/// Load a sheet image as 8-bit RGB
pub fn open_sheet(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path)?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Pixel size of a loaded sheet
pub fn image_size(image: &DynamicImage) -> Result<ImageSize> {
    let (width, height) = image.dimensions();
    ImageSize::new(width, height).map_err(FinderError::from)
}

/// Resize to a `size` x `size` model input, ignoring aspect ratio
pub fn resize_square(image: &DynamicImage, size: u32) -> DynamicImage {
    image.resize_exact(size, size, FilterType::CatmullRom)
}

/// Shrink each dimension to `ceil(dim / factor)`. A factor of 0 or 1 leaves
/// the image as is.
pub fn reduce(image: &DynamicImage, factor: u32) -> DynamicImage {
    if factor <= 1 {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    image.resize_exact(
        width.div_ceil(factor),
        height.div_ceil(factor),
        FilterType::Triangle,
    )
}

/// Crop `bbox` out of `image`, clamped to the image bounds.
///
/// Returns `None` when nothing of the box lies inside the image.
pub fn crop_label(image: &DynamicImage, bbox: &BoundingBox) -> Option<DynamicImage> {
    let (width, height) = image.dimensions();
    let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;

    let x0 = clamp(bbox.left, width);
    let y0 = clamp(bbox.top, height);
    let x1 = clamp(bbox.right, width);
    let y1 = clamp(bbox.bottom, height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}

/// File name of a label crop: `<stem>_<Class>_<left>_<top>_<right>_<bottom><ext>`
pub fn label_file_name(stem: &str, category: Category, bbox: &BoundingBox, ext: &str) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}{}",
        stem,
        category.name(),
        bbox.left as i64,
        bbox.top as i64,
        bbox.right as i64,
        bbox.bottom as i64,
        ext
    )
}

/// Save `image` under `dir` with the same file name as `source`
pub fn save_as(image: &DynamicImage, dir: &Path, source: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| FinderError::Other(format!("No file name in {}", source.display())))?;
    let target = dir.join(name);
    image.save(&target)?;
    Ok(target)
}

/// Extension of `path` with its leading dot, or empty
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
