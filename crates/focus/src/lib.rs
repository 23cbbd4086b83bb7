//! Batch focus stacking of segmented objects through Fiji's Stack Focuser.
//!
//! Each object directory produced by segmentation gets a generated macro,
//! Fiji runs it headless, and the batch is accepted once the first and last
//! directories contain `ij_focused.tif`.
//!
//! ```rust,no_run
//! use focus::{FocusBatchDispatcher, FocusSettings};
//! use std::path::Path;
//!
//! let settings = FocusSettings::default();
//! let dispatcher = FocusBatchDispatcher::from_settings(&settings)?;
//! let report = dispatcher.focus_directory(Path::new("out/slide07"), settings.kernel_size)?;
//! println!("{} objects in {:.1}s", report.invocations.len(), report.total_secs());
//! # Ok::<(), focus::FocusError>(())
//! ```

pub mod batch;
pub mod driver;
pub mod error;
pub mod script;
pub mod verify;

pub use batch::{BatchReport, FocusBatchDispatcher, FocusSettings, Invocation, discover_object_dirs};
pub use driver::{DriverError, FijiDriver, InvocationOutcome, StackFocuser};
pub use error::{FocusError, Result};
pub use script::{DEFAULT_KERNEL_SIZE, MACRO_FILE_NAME, macro_text, majority_extension, write_macro};
pub use verify::CompletionVerifier;
