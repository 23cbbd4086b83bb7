pub mod builder;

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::{info, warn};

use crate::{
    algorithms::{ObjectDetector, PlaneExtractor},
    error::{Result, SegmentError},
    traits::{ImageAccess, ReferencePlanePolicy},
    types::{BoundingBox, Detection},
};
use stack_common::RunConfig;

/// Hard ceiling on objects a `final` run may extract
pub const DEFAULT_OBJECT_LIMIT: usize = 10_000;

/// Overviews wider than this are downscaled before saving
pub const OVERVIEW_MAX_WIDTH: u32 = 2000;

/// Where a run is (or stopped)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, IntoStaticStr
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    Idle,
    DetectingObjects,
    PersistingConfig,
    ExtractingPlanes { plane: usize, of: usize },
    Done,
    Aborted,
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub unique_id: String,
    pub output_dir: PathBuf,
    pub state: PipelineState,
    pub reference_plane: PathBuf,
    pub plane_count: usize,
    pub boxes: Vec<BoundingBox>,
    pub overview_path: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub files_written: Vec<PathBuf>,
}

impl RunReport {
    pub fn object_count(&self) -> usize {
        self.boxes.len()
    }
}

/// Drives a run from plane listing through detection to per-object output
pub struct PipelineDriver {
    access: Box<dyn ImageAccess>,
    reference_policy: Box<dyn ReferencePlanePolicy>,
    object_limit: usize,
}

impl PipelineDriver {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        access: Box<dyn ImageAccess>,
        reference_policy: Box<dyn ReferencePlanePolicy>,
        object_limit: usize,
    ) -> Self {
        Self { access, reference_policy, object_limit }
    }

    /// Process a single resolved run
    pub fn run(&self, run: &RunConfig) -> Result<RunReport> {
        let mut state = PipelineState::Idle;
        info!(
            "Processing {} from {} in {} mode",
            run.settings.unique_id,
            run.settings.directory.display(),
            run.settings.mode
        );

        let planes = self
            .access
            .list_files(&run.settings.directory, &run.settings.input_ext)?;
        if planes.is_empty() {
            return Err(SegmentError::NoImages {
                directory: run.settings.directory.clone(),
                extension: run.settings.input_ext.clone(),
            });
        }

        let reference_index = self.reference_policy.select(planes.len()).ok_or_else(|| {
            SegmentError::NoReferencePlane {
                policy: self.reference_policy.name(),
                count: planes.len(),
            }
        })?;
        let reference_path = planes[reference_index].clone();

        transition(&mut state, PipelineState::DetectingObjects);
        info!("Reference plane {} ({})", reference_path.display(), self.reference_policy.name());
        let reference = self.access.load(&reference_path)?;
        let detection = ObjectDetector::from_run(run).detect(&reference)?;

        let mut report = RunReport {
            unique_id: run.settings.unique_id.clone(),
            output_dir: run.output_dir.clone(),
            state,
            reference_plane: reference_path,
            plane_count: planes.len(),
            boxes: Vec::new(),
            overview_path: None,
            settings_path: None,
            files_written: Vec::new(),
        };

        if run.is_final() {
            if let Err(err) = check_object_limit(detection.object_count(), self.object_limit) {
                transition(&mut state, PipelineState::Aborted);
                return Err(err);
            }
        }

        report.overview_path = self.save_overview(run, &detection);
        report.boxes = detection.boxes;

        if !run.is_final() {
            transition(&mut state, PipelineState::Done);
            report.state = state;
            return Ok(report);
        }

        transition(&mut state, PipelineState::PersistingConfig);
        report.settings_path = Some(run.persist()?);

        let plane_count = if run.settings.skip_last_plane {
            planes.len() - 1
        } else {
            planes.len()
        };
        let extractor = PlaneExtractor::new(self.access.as_ref(), run, report.boxes.len());

        for (plane_index, plane_path) in planes.iter().take(plane_count).enumerate() {
            transition(
                &mut state,
                PipelineState::ExtractingPlanes { plane: plane_index, of: plane_count },
            );
            let plane = self.access.load(plane_path)?;
            let written = extractor.extract_plane(&plane, plane_path, &report.boxes, plane_index)?;
            report.files_written.extend(written);
        }

        transition(&mut state, PipelineState::Done);
        info!(
            "Wrote {} files for {} objects into {}",
            report.files_written.len(),
            report.object_count(),
            run.output_dir.display()
        );
        report.state = state;
        Ok(report)
    }

    /// Save the overview next to the run output. Failures are logged and dropped.
    fn save_overview(&self, run: &RunConfig, detection: &Detection) -> Option<PathBuf> {
        let overview = detection.overview.as_ref()?;
        let path = run.output_dir.join(format!(
            "{}_{}_overview.jpg",
            run.settings.unique_id, run.image_file_label
        ));

        let scaled;
        let image = if overview.width() > OVERVIEW_MAX_WIDTH {
            let height = (overview.height() as u64 * OVERVIEW_MAX_WIDTH as u64
                / overview.width() as u64)
                .max(1) as u32;
            scaled = self.access.resize(overview, OVERVIEW_MAX_WIDTH, height);
            &scaled
        } else {
            overview
        };

        match self.access.save(image, &path, None) {
            Ok(()) => {
                info!("Saved overview to {}", path.display());
                Some(path)
            }
            Err(err) => {
                warn!("Could not save overview {}: {}", path.display(), err);
                None
            }
        }
    }
}

/// A `final` run may extract at most `limit` objects
pub fn check_object_limit(count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(SegmentError::TooManyObjects { count, limit });
    }
    Ok(())
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    info!("{} -> {}", state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use image::{Rgb, RgbImage};
    use stack_common::{OutputMode, naming};

    use crate::{algorithms::FirstPlane, io::ImageCrateAccess, test_utils::test_run};

    /// Three 100x100 planes with one bright 20x20 square at rows 30..50, cols 40..60
    fn write_stack(dir: &Path) {
        for p in 0..3 {
            let mut plane = RgbImage::from_pixel(100, 100, Rgb([10, 10, 10]));
            for y in 30..50 {
                for x in 40..60 {
                    plane.put_pixel(x, y, Rgb([240, 240, 240]));
                }
            }
            plane.save(dir.join(format!("plane_{p:03}.tif"))).unwrap();
        }
    }

    fn stack_run(source: &Path, output: &Path) -> RunConfig {
        let mut settings = test_run(output).settings;
        settings.directory = source.to_path_buf();
        RunConfig::resolve_at(settings, "0.1.0", "2024-01-01 00:00:00").unwrap()
    }

    fn object_dirs(output_dir: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<_> = fs::read_dir(output_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    #[test]
    fn test_final_run_writes_every_plane_of_every_object() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_stack(source.path());
        let run = stack_run(source.path(), output.path());

        let report = PipelineDriver::builder().build().run(&run).unwrap();

        assert_eq!(report.state, PipelineState::Done);
        assert_eq!(report.boxes, vec![BoundingBox::new(30, 40, 50, 60).unwrap()]);
        assert_eq!(report.files_written.len(), 3);
        assert!(report.reference_plane.ends_with("plane_002.tif"));

        let dirs = object_dirs(&run.output_dir);
        assert_eq!(dirs, vec![run.output_dir.join(naming::object_name("slide07", 1))]);
        assert_eq!(fs::read_dir(&dirs[0]).unwrap().count(), 3);
        assert!(dirs[0].join("slide07_obj00001_plane002.png").exists());

        let persisted = RunConfig::load_persisted(&run.output_dir).unwrap();
        assert_eq!(persisted, run);
        assert!(report.overview_path.unwrap().exists());
    }

    #[test]
    fn test_skip_last_plane() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_stack(source.path());
        let mut run = stack_run(source.path(), output.path());
        run.settings.skip_last_plane = true;

        let report = PipelineDriver::builder().build().run(&run).unwrap();

        assert_eq!(report.files_written.len(), 2);
        let dirs = object_dirs(&run.output_dir);
        assert_eq!(fs::read_dir(&dirs[0]).unwrap().count(), 2);
        assert!(!dirs[0].join("slide07_obj00001_plane002.png").exists());
    }

    #[test]
    fn test_sample_run_only_writes_overview() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_stack(source.path());
        let mut run = stack_run(source.path(), output.path());
        run.settings.mode = OutputMode::Sample;

        let report = PipelineDriver::builder().build().run(&run).unwrap();

        assert_eq!(report.object_count(), 1);
        assert!(report.files_written.is_empty());
        assert!(report.settings_path.is_none());
        assert!(object_dirs(&run.output_dir).is_empty());
        assert!(!run.output_dir.join("settings.json").exists());

        let overview = report.overview_path.unwrap();
        assert_eq!(
            overview.file_name().unwrap().to_string_lossy(),
            "slide07_th=0.5000_size=0100u-0900u_overview.jpg"
        );
        assert!(overview.exists());
    }

    #[test]
    fn test_object_ceiling_aborts_before_any_write() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_stack(source.path());
        let run = stack_run(source.path(), output.path());

        let driver = PipelineDriver::builder().with_object_limit(0).build();
        let result = driver.run(&run);

        assert!(matches!(result, Err(SegmentError::TooManyObjects { count: 1, limit: 0 })));
        assert!(!run.output_dir.exists());
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let run = stack_run(source.path(), output.path());

        let result = PipelineDriver::builder().build().run(&run);
        assert!(matches!(result, Err(SegmentError::NoImages { .. })));
    }

    #[test]
    fn test_reference_policy_is_pluggable() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_stack(source.path());
        let mut run = stack_run(source.path(), output.path());
        run.settings.mode = OutputMode::Sample;

        let driver = PipelineDriver::builder()
            .with_image_access(ImageCrateAccess::new())
            .with_reference_policy(FirstPlane)
            .build();
        let report = driver.run(&run).unwrap();
        assert!(report.reference_plane.ends_with("plane_000.tif"));
    }

    #[test]
    fn test_default_object_limit_boundary() {
        assert!(check_object_limit(0, DEFAULT_OBJECT_LIMIT).is_ok());
        assert!(check_object_limit(10_000, DEFAULT_OBJECT_LIMIT).is_ok());
        assert!(matches!(
            check_object_limit(10_001, DEFAULT_OBJECT_LIMIT),
            Err(SegmentError::TooManyObjects { count: 10_001, limit: 10_000 })
        ));
    }

    #[test]
    fn test_ten_thousand_and_one_objects_abort_final_run() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        // Isolated single pixels on even coordinates never touch, even diagonally
        let mut plane = RgbImage::new(200, 202);
        let spots = (0..202)
            .step_by(2)
            .flat_map(|y| (0..200).step_by(2).map(move |x| (x, y)))
            .take(DEFAULT_OBJECT_LIMIT + 1);
        for (x, y) in spots {
            plane.put_pixel(x, y, Rgb([255, 255, 255]));
        }
        plane.save(source.path().join("plane_000.tif")).unwrap();

        let mut run = stack_run(source.path(), output.path());
        run.settings.minimum_size = 1.0;
        run.settings.maximum_size = 1.0;

        let result = PipelineDriver::builder().build().run(&run);
        assert!(matches!(
            result,
            Err(SegmentError::TooManyObjects { count: 10_001, limit: 10_000 })
        ));
        assert!(!run.output_dir.exists());
    }

    #[test]
    fn test_wide_overview_is_downscaled() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut plane = RgbImage::new(2400, 60);
        for y in 10..30 {
            for x in 100..120 {
                plane.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        plane.save(source.path().join("plane_000.tif")).unwrap();
        let mut run = stack_run(source.path(), output.path());
        run.settings.mode = OutputMode::Sample;

        let report = PipelineDriver::builder().build().run(&run).unwrap();
        let overview = image::open(report.overview_path.unwrap()).unwrap();
        assert_eq!((overview.width(), overview.height()), (2000, 50));
    }
}
