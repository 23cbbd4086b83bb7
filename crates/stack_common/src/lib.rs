//! # Stack Common - Shared Types and Utilities
//!
//! Shared configuration, error types and small helpers for the focal-stack
//! segmentation and focusing crates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stack_common::{SettingsFile, RunConfig};
//!
//! let settings = SettingsFile::from_file("settings.toml")?;
//! for run in settings.resolve_all(env!("CARGO_PKG_VERSION"))? {
//!     println!("{} -> {}", run.settings.unique_id, run.output_dir.display());
//! }
//! # Ok::<(), stack_common::StackKitError>(())
//! ```

pub mod config;

use thiserror::Error;

pub use config::{OutputMode, ProcessPriority, RunConfig, RunSettings, SettingsFile};

/// Result type for stack kit operations
pub type Result<T> = std::result::Result<T, StackKitError>;

/// Standard error type for configuration and shared helpers
#[derive(Error, Debug)]
pub enum StackKitError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported settings format: {format}. Please use .toml or .json files")]
    UnsupportedFormat { format: String },

    #[error("Configuration validation failed: {details}")]
    ValidationFailed { details: String },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

/// Deterministic names shared by the segmentation output and the focus batch
pub mod naming {
    /// Every object directory name contains this marker
    pub const OBJECT_DIR_MARKER: &str = "_obj";

    /// Composite written by the external focus-stacking tool in each object directory
    pub const FOCUSED_FILE_NAME: &str = "ij_focused.tif";

    /// `{unique_id}_obj{index:05}`, with a 1-based object index
    pub fn object_name(unique_id: &str, object_index: usize) -> String {
        format!("{unique_id}{OBJECT_DIR_MARKER}{object_index:05}")
    }

    /// `{unique_id}_obj{index:05}_plane{plane:03}.{ext}`, with a 0-based plane index
    pub fn plane_file_name(
        unique_id: &str,
        object_index: usize,
        plane_index: usize,
        ext: &str,
    ) -> String {
        format!(
            "{}_plane{:03}.{}",
            object_name(unique_id, object_index),
            plane_index,
            super::utils::normalize_extension(ext)
        )
    }
}

/// Utility functions for file names and timing
pub mod utils {
    use std::path::Path;
    use std::time::Duration;

    use super::*;

    /// Extension of a path including the leading dot, or an empty string.
    pub fn dotted_extension(path: &Path) -> String {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }

    /// Strip a leading dot and lowercase, so `".TIF"` and `"tif"` compare equal.
    pub fn normalize_extension(ext: &str) -> String {
        ext.trim_start_matches('.').to_lowercase()
    }

    /// Check whether a file name carries the given extension (case-insensitive)
    pub fn has_extension(path: &Path, ext: &str) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&normalize_extension(ext)))
    }

    /// Format an elapsed duration the way operators read it in the logs
    pub fn format_elapsed(elapsed: Duration) -> String {
        format!("{:6.3} seconds", elapsed.as_secs_f64())
    }

    /// Ensure output directory exists
    pub fn ensure_output_dir(path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_dotted_extension() {
        assert_eq!(utils::dotted_extension(Path::new("a/b/plane_001.tif")), ".tif");
        assert_eq!(utils::dotted_extension(Path::new("a/b/README")), "");
    }

    #[test]
    fn test_has_extension_ignores_case_and_dot() {
        assert!(utils::has_extension(Path::new("x.TIF"), "tif"));
        assert!(utils::has_extension(Path::new("x.tif"), ".tif"));
        assert!(!utils::has_extension(Path::new("x.png"), "tif"));
        assert!(!utils::has_extension(Path::new("tif"), "tif"));
    }

    #[test]
    fn test_naming() {
        assert_eq!(naming::object_name("slide07", 3), "slide07_obj00003");
        assert_eq!(
            naming::plane_file_name("slide07", 3, 12, ".TIF"),
            "slide07_obj00003_plane012.tif"
        );
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(utils::format_elapsed(Duration::from_millis(1500)), " 1.500 seconds");
    }
}
