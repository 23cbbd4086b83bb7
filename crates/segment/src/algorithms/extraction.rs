use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use stack_common::{RunConfig, naming};
use tracing::debug;

use crate::{
    error::Result,
    traits::ImageAccess,
    types::BoundingBox,
};

/// Crops every detected box out of a plane and writes one labelled file per
/// object into that object's directory.
pub struct PlaneExtractor<'a> {
    access: &'a dyn ImageAccess,
    run: &'a RunConfig,
    object_count: usize,
}

impl<'a> PlaneExtractor<'a> {
    pub fn new(access: &'a dyn ImageAccess, run: &'a RunConfig, object_count: usize) -> Self {
        Self { access, run, object_count }
    }

    /// `{output_dir}/{unique_id}_obj{index:05}`
    pub fn object_dir(&self, object_index: usize) -> PathBuf {
        self.run
            .output_dir
            .join(naming::object_name(&self.run.settings.unique_id, object_index))
    }

    pub fn output_path(&self, object_index: usize, plane_index: usize) -> PathBuf {
        self.object_dir(object_index).join(naming::plane_file_name(
            &self.run.settings.unique_id,
            object_index,
            plane_index,
            &self.run.settings.output_ext,
        ))
    }

    /// First label line: ordinal, size and slide position of the object
    pub fn describe(
        &self,
        bbox: &BoundingBox,
        object_index: usize,
        image_width: u32,
        image_height: u32,
    ) -> String {
        let rect = bbox.to_crop_rect();
        let (x_percent, y_percent) = bbox.position_percent(image_width, image_height);
        format!(
            "Object #{:05} of {:05} ( {} x {} pixels at slide position {:05.2} x {:05.2} )",
            object_index,
            self.object_count,
            rect.width(),
            rect.height(),
            x_percent,
            y_percent
        )
    }

    /// Full label: description, source plane, then the run's metadata lines
    pub fn label(&self, description: String, plane_path: &Path) -> Vec<String> {
        let source = plane_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| plane_path.display().to_string());

        let mut lines = Vec::with_capacity(self.run.image_label.len() + 2);
        lines.push(description);
        lines.push(format!("Source: {source}"));
        lines.extend(self.run.image_label.iter().cloned());
        lines
    }

    /// Crop one object out of one plane, label it and save it.
    ///
    /// `object_index` is 1-based, `plane_index` 0-based.
    pub fn extract(
        &self,
        plane: &RgbImage,
        plane_path: &Path,
        bbox: &BoundingBox,
        object_index: usize,
        plane_index: usize,
    ) -> Result<PathBuf> {
        let crop = self.access.crop(plane, bbox.to_crop_rect())?;

        let description = self.describe(bbox, object_index, plane.width(), plane.height());
        let label = self.label(description, plane_path);
        let labelled = self.access.annotate(&crop, &label)?;

        let object_dir = self.object_dir(object_index);
        if !object_dir.exists() {
            fs::create_dir_all(&object_dir)?;
        }

        let output_path = self.output_path(object_index, plane_index);
        self.access.save(&labelled, &output_path, Some(&label.join(". ")))?;
        debug!("Wrote {}", output_path.display());
        Ok(output_path)
    }

    /// Extract every box from one plane, in object-index order
    pub fn extract_plane(
        &self,
        plane: &RgbImage,
        plane_path: &Path,
        boxes: &[BoundingBox],
        plane_index: usize,
    ) -> Result<Vec<PathBuf>> {
        boxes
            .iter()
            .enumerate()
            .map(|(i, bbox)| self.extract(plane, plane_path, bbox, i + 1, plane_index))
            .collect()
    }
}
