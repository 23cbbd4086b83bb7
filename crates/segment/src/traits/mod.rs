use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};
use crate::{error::Result, types::CropRect};

/// Image codec and pixel primitives the pipeline calls through.
///
/// Pixel arrays are indexed `(row, col)` from the top-left corner with a
/// `(height, width)` shape.
pub trait ImageAccess: Send + Sync {
    /// Load an image file as 8-bit RGB
    fn load(&self, path: &Path) -> Result<RgbImage>;

    /// Copy out the sub-rectangle `[x1, x2) x [y1, y2)`
    fn crop(&self, image: &RgbImage, rect: CropRect) -> Result<RgbImage>;

    /// Resample to exactly `width` x `height`
    fn resize(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage;

    /// Render the label lines onto (or next to) the image
    fn annotate(&self, image: &RgbImage, lines: &[String]) -> Result<RgbImage>;

    /// Save, attaching `comment` as file metadata where the format allows it
    fn save(&self, image: &RgbImage, path: &Path, comment: Option<&str>) -> Result<()>;

    /// Files directly inside `dir` with the given extension, in sorted order
    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>>;
}

/// Trait for image preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Turn a grayscale plane into a binary foreground mask
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Picks the plane that detection runs on.
pub trait ReferencePlanePolicy: Send + Sync {
    /// Index into the ordered plane list, `None` if the list cannot satisfy the policy
    fn select(&self, plane_count: usize) -> Option<usize>;

    /// Name used in logs and errors
    fn name(&self) -> String;
}
