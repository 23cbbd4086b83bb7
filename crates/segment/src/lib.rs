//! # Focal Stack Segmentation
//!
//! Finds objects on one plane of a focal stack and cuts every object out of
//! every plane, so each object ends up with its own directory of aligned,
//! labelled crops ready for focus stacking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segment::PipelineBuilder;
//! use stack_common::SettingsFile;
//!
//! let runs = SettingsFile::from_file("settings.toml")?.resolve_all(env!("CARGO_PKG_VERSION"))?;
//! for run in &runs {
//!     let report = PipelineBuilder::for_run(run)?.run(run)?;
//!     println!("{}: {} objects", report.unique_id, report.object_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use segment::{PipelineDriver, FirstPlane, ImageCrateAccess};
//! use std::path::Path;
//!
//! let driver = PipelineDriver::builder()
//!     .with_image_access(ImageCrateAccess::new().with_font_file(Path::new("DejaVuSans.ttf"))?)
//!     .with_reference_policy(FirstPlane)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Result, SegmentError};
pub use types::{BoundingBox, CropRect, Detection};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{
    DEFAULT_OBJECT_LIMIT, PipelineDriver, PipelineState, RunReport, builder::PipelineBuilder,
    check_object_limit,
};
pub use io::*;
