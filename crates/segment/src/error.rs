use std::path::PathBuf;

use thiserror::Error;

use crate::types::CropRect;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] stack_common::StackKitError),

    #[error("No .{extension} images found in {}", directory.display())]
    NoImages { directory: PathBuf, extension: String },

    #[error("Reference plane policy '{policy}' selects nothing from {count} planes")]
    NoReferencePlane { policy: String, count: usize },

    #[error(
        "Over {limit} objects are identified in the image ({count} found), \
         are you sure you want to continue?"
    )]
    TooManyObjects { count: usize, limit: usize },

    #[error("Crop {rect:?} lies outside a {width}x{height} image")]
    CropOutOfBounds { rect: CropRect, width: u32, height: u32 },

    #[error("Overview rendering failed: {0}")]
    Overview(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBox(String),

    #[error("Failed to load label font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("TIFF encoding error: {0}")]
    TiffEncoding(#[from] tiff::TiffError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegmentError>;
