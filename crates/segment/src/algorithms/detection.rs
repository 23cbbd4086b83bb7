use image::{GrayImage, Luma, Rgb, RgbImage, imageops};
use imageproc::{
    drawing::draw_hollow_rect_mut,
    rect::Rect,
    region_labelling::{Connectivity, connected_components},
};
use stack_common::RunConfig;
use tracing::{debug, info, warn};

use crate::{
    algorithms::ThresholdPreprocessor,
    error::{Result, SegmentError},
    traits::ImagePreprocessor,
    types::{BoundingBox, Detection},
};

/// Outline colour for boxes on the overview image
pub const OVERVIEW_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Finds objects on a reference plane by thresholding and size filtering.
///
/// Sizes are areas in physical units; they are converted to pixel areas with
/// the square of `units_per_pixel`. A region survives when the area of its
/// bounding box lies within the converted bounds, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetector {
    /// Fraction of full intensity in `[0, 1]`
    pub threshold: f64,
    pub minimum_size: f64,
    pub maximum_size: f64,
    pub units_per_pixel: f64,
}

/// Running extent of one labelled region
#[derive(Debug, Clone, Copy)]
struct Region {
    min_row: u32,
    min_col: u32,
    max_row: u32,
    max_col: u32,
}

impl Region {
    fn at(row: u32, col: u32) -> Self {
        Self { min_row: row, min_col: col, max_row: row, max_col: col }
    }

    fn include(&mut self, row: u32, col: u32) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_inclusive(self.min_row, self.min_col, self.max_row, self.max_col)
    }
}

impl ObjectDetector {
    pub fn new(threshold: f64, minimum_size: f64, maximum_size: f64, units_per_pixel: f64) -> Self {
        Self { threshold, minimum_size, maximum_size, units_per_pixel }
    }

    pub fn from_run(run: &RunConfig) -> Self {
        let s = &run.settings;
        Self::new(s.threshold, s.minimum_size, s.maximum_size, s.units_per_pixel)
    }

    /// `(min, max)` object area in pixels
    pub fn pixel_area_bounds(&self) -> (f64, f64) {
        let pixel_area = self.units_per_pixel * self.units_per_pixel;
        (self.minimum_size / pixel_area, self.maximum_size / pixel_area)
    }

    /// Threshold, label 8-connected regions and keep those within the size
    /// bounds. Boxes come back sorted by `(y1, x1, y2, x2)`.
    pub fn find_boxes(&self, image: &GrayImage) -> Result<Vec<BoundingBox>> {
        let binary = ThresholdPreprocessor::from_fraction(self.threshold).preprocess(image)?;
        let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

        let mut regions: Vec<Option<Region>> = Vec::new();
        for (col, row, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if label >= regions.len() {
                regions.resize(label + 1, None);
            }
            if let Some(region) = &mut regions[label] {
                region.include(row, col);
            } else {
                regions[label] = Some(Region::at(row, col));
            }
        }

        let (min_area, max_area) = self.pixel_area_bounds();
        let region_count = regions.iter().flatten().count();

        let mut boxes: Vec<BoundingBox> = regions
            .into_iter()
            .flatten()
            .map(|region| region.bounding_box())
            .filter(|bbox| {
                let area = bbox.area() as f64;
                area >= min_area && area <= max_area
            })
            .collect();
        boxes.sort_by_key(BoundingBox::as_tuple);

        debug!(
            "{} regions above threshold, {} within {:.1} - {:.1} px²",
            region_count,
            boxes.len(),
            min_area,
            max_area
        );
        Ok(boxes)
    }

    /// Detect objects on the reference plane and render the overview image.
    ///
    /// A failed overview is logged and dropped; it never fails detection.
    pub fn detect(&self, reference: &RgbImage) -> Result<Detection> {
        info!("Finding objects");
        let gray = imageops::grayscale(reference);
        let boxes = self.find_boxes(&gray)?;
        info!("Found {} objects", boxes.len());

        let overview = match render_overview(reference, &boxes) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Skipping overview image: {}", err);
                None
            }
        };

        Ok(Detection {
            boxes,
            overview,
            image_width: reference.width(),
            image_height: reference.height(),
        })
    }
}

/// Draw every box onto a copy of the reference plane
pub fn render_overview(image: &RgbImage, boxes: &[BoundingBox]) -> Result<RgbImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SegmentError::Overview("reference image is empty".to_string()));
    }

    let mut canvas = image.clone();
    for bbox in boxes {
        if bbox.x2 > image.width() || bbox.y2 > image.height() {
            return Err(SegmentError::Overview(format!(
                "box {:?} exceeds {}x{} image",
                bbox.as_tuple(),
                image.width(),
                image.height()
            )));
        }

        let outer = Rect::at(bbox.x1 as i32, bbox.y1 as i32).of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(&mut canvas, outer, OVERVIEW_BOX_COLOR);

        // Second, inset outline so boxes stay visible once the overview is downscaled
        if bbox.width() > 2 && bbox.height() > 2 {
            let inner = Rect::at(bbox.x1 as i32 + 1, bbox.y1 as i32 + 1)
                .of_size(bbox.width() - 2, bbox.height() - 2);
            draw_hollow_rect_mut(&mut canvas, inner, OVERVIEW_BOX_COLOR);
        }
    }
    Ok(canvas)
}
