use std::path::{Path, PathBuf};

use stack_common::naming;
use tracing::info;

use crate::error::{FocusError, Result};

/// Checks that the focuser produced its composite across the whole batch.
///
/// Only the first and last object directories are inspected: a missing first
/// composite means the tool never ran, a missing last one means it stopped
/// part way.
pub struct CompletionVerifier;

impl CompletionVerifier {
    pub fn verify(first_object_dir: &Path, last_object_dir: &Path) -> Result<()> {
        let first = first_object_dir.join(naming::FOCUSED_FILE_NAME);
        if !first.exists() {
            return Err(FocusError::NeverStarted(first));
        }

        let last = last_object_dir.join(naming::FOCUSED_FILE_NAME);
        if !last.exists() {
            return Err(FocusError::DidNotFinish(last));
        }

        info!("Fiji finished!");
        Ok(())
    }

    /// Verify a full, ordered list of object directories
    pub fn verify_all(object_dirs: &[PathBuf], parent: &Path) -> Result<()> {
        match (object_dirs.first(), object_dirs.last()) {
            (Some(first), Some(last)) => Self::verify(first, last),
            _ => Err(FocusError::NoObjects(parent.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_verify() {
        let root = tempfile::tempdir().unwrap();
        let first = root.path().join("a_obj00001");
        let last = root.path().join("a_obj00009");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&last).unwrap();

        assert!(matches!(
            CompletionVerifier::verify(&first, &last),
            Err(FocusError::NeverStarted(_))
        ));

        fs::write(first.join(naming::FOCUSED_FILE_NAME), b"").unwrap();
        assert!(matches!(
            CompletionVerifier::verify(&first, &last),
            Err(FocusError::DidNotFinish(_))
        ));

        fs::write(last.join(naming::FOCUSED_FILE_NAME), b"").unwrap();
        assert!(CompletionVerifier::verify(&first, &last).is_ok());
    }

    #[test]
    fn test_single_object_is_first_and_last() {
        let root = tempfile::tempdir().unwrap();
        let only = root.path().join("a_obj00001");
        fs::create_dir_all(&only).unwrap();
        fs::write(only.join(naming::FOCUSED_FILE_NAME), b"").unwrap();

        assert!(CompletionVerifier::verify_all(&[only], root.path()).is_ok());
        assert!(matches!(
            CompletionVerifier::verify_all(&[], root.path()),
            Err(FocusError::NoObjects(_))
        ));
    }
}
