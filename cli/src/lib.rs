use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use focus::{BatchReport, FocusBatchDispatcher, FocusSettings};
use segment::{PipelineBuilder, RunReport};
use serde::{Deserialize, Serialize};
use stack_common::{RunConfig, SettingsFile};
use tracing::{info, warn};

/// Version stamped into every label and persisted configuration
pub const CODE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of segmenting one run and, for `final` runs, focusing its objects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobReport {
    pub run: RunReport,
    pub focus: Option<BatchReport>,
}

/// Load and resolve every run in a `.toml` or `.json` settings file
pub fn load_runs(path: &Path) -> Result<Vec<RunConfig>> {
    let settings = SettingsFile::from_file(path)
        .wrap_err_with(|| format!("Failed to load settings from {}", path.display()))?;
    let runs = settings.resolve_all(CODE_VERSION)?;
    info!("Loaded {} run(s) from {}", runs.len(), path.display());
    Ok(runs)
}

/// Segment every run in order
pub fn segment_runs(runs: &[RunConfig]) -> Result<Vec<RunReport>> {
    let mut reports = Vec::with_capacity(runs.len());
    for (i, run) in runs.iter().enumerate() {
        info!("Running configuration {} of {}", i + 1, runs.len());
        run.settings.priority.apply()?;

        let driver = PipelineBuilder::for_run(run)?;
        let report = driver
            .run(run)
            .wrap_err_with(|| format!("Segmentation of {} failed", run.settings.unique_id))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Focus every object directory under `parent` and verify the batch
pub fn focus_objects(parent: &Path, settings: &FocusSettings) -> Result<BatchReport> {
    let dispatcher = FocusBatchDispatcher::from_settings(settings)?;
    let report = dispatcher
        .focus_directory(parent, settings.kernel_size)
        .wrap_err_with(|| format!("Focus stacking under {} failed", parent.display()))?;
    Ok(report)
}

/// Segment each run, then focus the objects of every `final` run that found any
pub fn segment_and_focus(runs: &[RunConfig], focus: &FocusSettings) -> Result<Vec<JobReport>> {
    // Fail on a bad platform or kernel before any segmentation work
    let dispatcher = FocusBatchDispatcher::from_settings(focus)?;

    let mut jobs = Vec::with_capacity(runs.len());
    for (run, report) in runs.iter().zip(segment_runs(runs)?) {
        let batch = if !run.is_final() {
            None
        } else if report.object_count() == 0 {
            warn!("{} produced no objects, skipping focus", run.settings.unique_id);
            None
        } else {
            Some(dispatcher.focus_directory(&run.output_dir, focus.kernel_size)?)
        };
        jobs.push(JobReport { run: report, focus: batch });
    }
    Ok(jobs)
}

/// Save any report as pretty JSON
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content)
        .wrap_err_with(|| format!("Failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}
