use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};

/// Axis-aligned box in pixel coordinates, stored as `(y1, x1, y2, x2)`.
///
/// `(y1, x1)` is the top-left pixel of the object. `y2` and `x2` are one past
/// the last row and column, so `height = y2 - y1` and `width = x2 - x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub y1: u32,
    pub x1: u32,
    pub y2: u32,
    pub x2: u32,
}

/// The same region in the `(x1, y1, x2, y2)` order the crop primitive takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn new(y1: u32, x1: u32, y2: u32, x2: u32) -> Result<Self> {
        if y2 <= y1 || x2 <= x1 {
            return Err(SegmentError::InvalidBox(format!(
                "({y1}, {x1}, {y2}, {x2}) must satisfy y2 > y1 and x2 > x1"
            )));
        }
        Ok(Self { y1, x1, y2, x2 })
    }

    /// Box spanning inclusive min/max pixel coordinates of a region
    pub(crate) fn from_inclusive(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self {
            y1: min_row,
            x1: min_col,
            y2: max_row + 1,
            x2: max_col + 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.y1, self.x1, self.y2, self.x2)
    }

    /// Permute into the crop primitive's `(x1, y1, x2, y2)` order.
    ///
    /// This is the only place the two orders meet.
    pub fn to_crop_rect(&self) -> CropRect {
        CropRect {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }

    /// Top-left corner as a percentage of the image's width (x) and height (y)
    pub fn position_percent(&self, image_width: u32, image_height: u32) -> (f64, f64) {
        (
            self.x1 as f64 / image_width as f64 * 100.0,
            self.y1 as f64 / image_height as f64 * 100.0,
        )
    }
}

impl CropRect {
    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox {
            y1: self.y1,
            x1: self.x1,
            y2: self.y2,
            x2: self.x2,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Result of running detection on a reference plane
#[derive(Debug, Clone)]
pub struct Detection {
    /// Boxes in object-index order (index = position + 1)
    pub boxes: Vec<BoundingBox>,
    /// Reference plane with every box drawn, when rendering succeeded
    pub overview: Option<RgbImage>,
    pub image_width: u32,
    pub image_height: u32,
}

impl Detection {
    pub fn object_count(&self) -> usize {
        self.boxes.len()
    }
}
