//! Typed run configuration.
//!
//! A settings file holds one or more `[[run]]` tables. Each is validated once
//! and resolved into a [`RunConfig`], which carries the derived output
//! directory, file label and multi-line image label consumed by the
//! segmentation pipeline. A `final` run persists its resolved configuration
//! next to its output so results stay auditable.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::{Result, StackKitError, utils};

/// Unique ids containing this marker come from the Yale Peabody collection and
/// carry the catalog number in their second dot-separated segment.
pub const YALE_ID_MARKER: &str = "IP";

/// Name of the persisted configuration inside a run's output directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputMode {
    /// Detect, persist settings and write every plane of every object
    Final,
    /// Detect and render the overview image only
    #[default]
    Sample,
}

/// Scheduling priority applied to the whole process before any work starts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProcessPriority {
    #[default]
    Unchanged,
    /// Increment passed to `renice` for the current process
    Nice(i32),
}

impl ProcessPriority {
    pub fn apply(&self) -> Result<()> {
        let ProcessPriority::Nice(increment) = *self else {
            return Ok(());
        };

        let pid = std::process::id().to_string();
        let output = Command::new("renice")
            .args(["-n", &increment.to_string(), "-p", &pid])
            .output()?;

        if output.status.success() {
            info!("Process priority adjusted by {}", increment);
        } else {
            warn!(
                "renice exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// One run as written by the operator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunSettings {
    /// Directory holding the focal planes of one stack
    pub directory: PathBuf,
    /// Parent of the per-run output directory
    pub output_root: PathBuf,
    #[serde(default = "default_ext")]
    pub input_ext: String,
    #[serde(default = "default_ext")]
    pub output_ext: String,
    /// Detection threshold as a fraction of full intensity
    #[schemars(range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    /// Smallest object area kept, in `unit`²
    pub minimum_size: f64,
    /// Largest object area kept, in `unit`²
    pub maximum_size: f64,
    /// Linear scale of one pixel in `unit`
    pub units_per_pixel: f64,
    #[serde(default)]
    pub mode: OutputMode,
    /// The last plane of some stacks is not a true focal plane
    #[serde(default)]
    pub skip_last_plane: bool,
    pub unique_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_unknown")]
    pub location: String,
    #[serde(default)]
    pub catalog_prefix: Option<String>,
    #[serde(default = "default_unknown")]
    pub age: String,
    #[serde(default = "default_unknown")]
    pub source: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// TrueType/OpenType font used to burn labels into crops
    #[serde(default)]
    pub label_font: Option<PathBuf>,
    #[serde(default)]
    pub priority: ProcessPriority,
}

fn default_ext() -> String {
    "tif".to_string()
}

fn default_unknown() -> String {
    "unknown".to_string()
}

fn default_unit() -> String {
    "microns".to_string()
}

impl RunSettings {
    /// Check every field constraint once, before any processing
    pub fn validate(&self) -> Result<()> {
        let fail =
            |details: String| -> Result<()> { Err(StackKitError::ValidationFailed { details }) };

        if !(0.0..=1.0).contains(&self.threshold) {
            return fail(format!("threshold {} is outside [0, 1]", self.threshold));
        }
        if !(self.units_per_pixel.is_finite() && self.units_per_pixel > 0.0) {
            return fail(format!("units_per_pixel must be positive, got {}", self.units_per_pixel));
        }
        if !(self.minimum_size >= 0.0 && self.minimum_size <= self.maximum_size) {
            return fail(format!(
                "size filter {} - {} must satisfy 0 <= minimum <= maximum",
                self.minimum_size, self.maximum_size
            ));
        }
        if self.unique_id.trim().is_empty() {
            return fail("unique_id must not be empty".to_string());
        }
        if utils::normalize_extension(&self.input_ext).is_empty()
            || utils::normalize_extension(&self.output_ext).is_empty()
        {
            return fail("input_ext and output_ext must not be empty".to_string());
        }
        Ok(())
    }

    /// Catalog number shown on every label, `None` without a prefix.
    pub fn catalog_number(&self) -> String {
        let Some(prefix) = self.catalog_prefix.as_deref().filter(|p| !p.is_empty()) else {
            return "None".to_string();
        };

        let id = if self.unique_id.contains(YALE_ID_MARKER) {
            self.unique_id.split('.').nth(1).unwrap_or(&self.unique_id)
        } else {
            &self.unique_id
        };
        format!("{prefix} {id}")
    }
}

/// A run with all derived fields filled in. Read-only once resolved.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    #[serde(flatten)]
    pub settings: RunSettings,
    pub output_dir: PathBuf,
    /// Last component of the source directory
    pub subdirectory: String,
    pub image_file_label: String,
    pub image_label: Vec<String>,
    pub version: String,
    pub timestamp: String,
}

impl RunConfig {
    /// Validate and resolve, stamping the current local time
    pub fn resolve(settings: RunSettings, version: &str) -> Result<Self> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self::resolve_at(settings, version, timestamp)
    }

    pub fn resolve_at(
        settings: RunSettings,
        version: &str,
        timestamp: impl Into<String>,
    ) -> Result<Self> {
        settings.validate()?;

        let output_dir = settings.output_root.join(&settings.unique_id);
        let subdirectory = settings
            .directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| settings.directory.display().to_string());
        let image_file_label = format!(
            "th={:05.4}_size={:04.0}u-{:04.0}u",
            settings.threshold, settings.minimum_size, settings.maximum_size
        );

        let mut config = Self {
            settings,
            output_dir,
            subdirectory,
            image_file_label,
            image_label: Vec::new(),
            version: version.to_string(),
            timestamp: timestamp.into(),
        };
        config.image_label = config.build_image_label();
        Ok(config)
    }

    fn build_image_label(&self) -> Vec<String> {
        let s = &self.settings;

        let mut processed = format!("Processed at {}", s.location);
        if let Some(author) = s.author.as_deref().filter(|a| !a.is_empty()) {
            processed.push_str(&format!(" by {author}"));
        }
        processed.push_str(&format!(" (Catalog Number: {})", s.catalog_number()));

        vec![
            format!(
                "{:4.2} {} per pixel | Age and Source:  {} from {}",
                s.units_per_pixel, s.unit, s.age, s.source
            ),
            processed,
            format!("CODE VERSION: {}, PROCESSED ON: {}", self.version, self.timestamp),
            format!(
                "Threshold of {:4.2} and size filter of {} - {} {}",
                s.threshold, s.minimum_size as i64, s.maximum_size as i64, s.unit
            ),
            format!("Directory: {}", self.subdirectory),
        ]
    }

    pub fn is_final(&self) -> bool {
        self.settings.mode == OutputMode::Final
    }

    /// Write the resolved configuration into the output directory
    pub fn persist(&self) -> Result<PathBuf> {
        utils::ensure_output_dir(&self.output_dir)?;
        let path = self.output_dir.join(SETTINGS_FILE_NAME);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Saved settings into {}", path.display());
        Ok(path)
    }

    /// Read back a configuration written by [`RunConfig::persist`]
    pub fn load_persisted<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let content = fs::read_to_string(output_dir.as_ref().join(SETTINGS_FILE_NAME))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A settings file: one or more runs processed in order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SettingsFile {
    #[serde(rename = "run")]
    pub runs: Vec<RunSettings>,
}

impl SettingsFile {
    /// Get the JSON schema for the settings format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SettingsFile)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StackKitError::FileNotFound { path: path.display().to_string() });
        }

        let content = fs::read_to_string(path)?;
        debug!("Loaded {} bytes of settings from {}", content.len(), path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(StackKitError::UnsupportedFormat {
                format: other.unwrap_or_default().to_string(),
            }),
        }
    }

    /// Validate and resolve every run; any invalid run fails the whole file.
    pub fn resolve_all(&self, version: &str) -> Result<Vec<RunConfig>> {
        if self.runs.is_empty() {
            return Err(StackKitError::ValidationFailed {
                details: "settings file contains no [[run]] entries".to_string(),
            });
        }
        self.runs
            .iter()
            .cloned()
            .map(|settings| RunConfig::resolve(settings, version))
            .collect()
    }
}
