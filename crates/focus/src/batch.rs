use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stack_common::{naming, utils};
use tracing::{info, warn};

use crate::{
    driver::{FijiDriver, StackFocuser, fiji::DEFAULT_MEMORY},
    error::{FocusError, Result},
    script::{self, DEFAULT_KERNEL_SIZE},
    verify::CompletionVerifier,
};

/// Options for one focus batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FocusSettings {
    #[serde(default = "default_kernel_size")]
    pub kernel_size: u32,
    #[serde(default = "default_memory")]
    pub memory: String,
    /// Overrides the per-platform launcher
    #[serde(default)]
    pub executable: Option<PathBuf>,
}

fn default_kernel_size() -> u32 {
    DEFAULT_KERNEL_SIZE
}

fn default_memory() -> String {
    DEFAULT_MEMORY.to_string()
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            memory: DEFAULT_MEMORY.to_string(),
            executable: None,
        }
    }
}

impl FocusSettings {
    /// Fiji driver for these settings. Fails on hosts without a known launcher
    /// unless an executable is given.
    pub fn driver(&self) -> Result<FijiDriver> {
        script::check_kernel_size(self.kernel_size)?;
        let driver = match &self.executable {
            Some(path) => FijiDriver::new(path),
            None => FijiDriver::for_host()?,
        };
        Ok(driver.with_memory(&self.memory))
    }
}

/// One object directory's trip through the focuser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Invocation {
    pub object_dir: PathBuf,
    pub macro_path: PathBuf,
    pub exit_code: Option<i32>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub invocations: Vec<Invocation>,
}

impl BatchReport {
    pub fn total_secs(&self) -> f64 {
        self.invocations.iter().map(|i| i.elapsed_secs).sum()
    }
}

/// Subdirectories of `parent` that hold one object's planes, sorted by name
pub fn discover_object_dirs(parent: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(parent)? {
        let path = entry?.path();
        let is_object = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(naming::OBJECT_DIR_MARKER));
        if path.is_dir() && is_object {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Runs the focuser over object directories one at a time
pub struct FocusBatchDispatcher {
    focuser: Box<dyn StackFocuser>,
}

impl FocusBatchDispatcher {
    pub fn new<F>(focuser: F) -> Self
    where
        F: StackFocuser + 'static,
    {
        Self { focuser: Box::new(focuser) }
    }

    pub fn from_settings(settings: &FocusSettings) -> Result<Self> {
        Ok(Self::new(settings.driver()?))
    }

    /// Write a macro into each directory and invoke the focuser on it.
    ///
    /// A failed or non-zero invocation is logged and the batch moves on;
    /// [`CompletionVerifier`] decides whether the batch as a whole worked.
    pub fn dispatch_all(&self, object_dirs: &[PathBuf], kernel_size: u32) -> Result<BatchReport> {
        script::check_kernel_size(kernel_size)?;
        info!("Begin focus processing with {}", self.focuser.description());

        let mut report = BatchReport::default();
        for object_dir in object_dirs {
            let start = Instant::now();
            info!("Object: {}", object_dir.display());

            let macro_path = script::write_macro(object_dir, kernel_size)?;
            let exit_code = match self.focuser.focus(&macro_path) {
                Ok(outcome) => outcome.exit_code,
                Err(err) => {
                    warn!("{}", err);
                    None
                }
            };

            let elapsed = start.elapsed();
            info!("Time Elapsed: {}", utils::format_elapsed(elapsed));
            report.invocations.push(Invocation {
                object_dir: object_dir.clone(),
                macro_path,
                exit_code,
                elapsed_secs: elapsed.as_secs_f64(),
            });
        }

        info!(
            "Focused {} objects in {}",
            report.invocations.len(),
            utils::format_elapsed(Duration::from_secs_f64(report.total_secs()))
        );
        Ok(report)
    }

    /// Discover, dispatch and verify every object directory under `parent`
    pub fn focus_directory(&self, parent: &Path, kernel_size: u32) -> Result<BatchReport> {
        let object_dirs = discover_object_dirs(parent)?;
        if object_dirs.is_empty() {
            return Err(FocusError::NoObjects(parent.to_path_buf()));
        }

        let report = self.dispatch_all(&object_dirs, kernel_size)?;
        CompletionVerifier::verify_all(&object_dirs, parent)?;
        Ok(report)
    }
}
