use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use stack_common::{naming, utils};
use tracing::debug;

use crate::error::{FocusError, Result};

pub const MACRO_FILE_NAME: &str = "macro.ijm";
pub const DEFAULT_KERNEL_SIZE: u32 = 11;

/// Stack Focuser needs an odd kernel
pub fn check_kernel_size(kernel_size: u32) -> Result<()> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(FocusError::InvalidKernelSize(kernel_size));
    }
    Ok(())
}

/// Most common extension (with its leading dot) among the regular files
/// directly inside `dir`. Ties go to the extension seen first in file-name order.
pub fn majority_extension(dir: &Path) -> Result<String> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for file in &files {
        let ext = utils::dotted_extension(file);
        let count = counts.entry(ext.clone()).or_insert(0);
        if *count == 0 {
            order.push(ext);
        }
        *count += 1;
    }

    // max_by_key keeps the last maximum, so walk the first-seen order in reverse
    order
        .into_iter()
        .rev()
        .max_by_key(|ext| counts[ext])
        .ok_or_else(|| FocusError::EmptyObjectDir(dir.to_path_buf()))
}

/// Fiji macro that focuses the image sequence in `object_dir` into
/// `ij_focused.tif` in the same directory
pub fn macro_text(object_dir: &Path, extension: &str, kernel_size: u32) -> String {
    let name = object_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let output = object_dir.join(naming::FOCUSED_FILE_NAME);

    format!(
        "setBatchMode(true);\n\
         run(\"Image Sequence...\", \"open={} file=[{}] convert sort\");\n\
         run(\"Stack Focuser \", \"enter={}\");\n\
         selectWindow(\"Focused_{}\");\n\
         saveAs(\"Tiff\",\"{}\");\n\
         close(\"*\");\n",
        object_dir.display(),
        extension,
        kernel_size,
        stem,
        output.display()
    )
}

/// Write (or overwrite) the macro for one object directory
pub fn write_macro(object_dir: &Path, kernel_size: u32) -> Result<PathBuf> {
    check_kernel_size(kernel_size)?;
    let extension = majority_extension(object_dir)?;
    let path = object_dir.join(MACRO_FILE_NAME);
    fs::write(&path, macro_text(object_dir, &extension, kernel_size))?;
    debug!("Wrote macro {} for {} files", path.display(), extension);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_majority_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.tif", "b.tif", "c.tif", "d.tif", "e.tif", "f.png", "g.png"]);
        assert_eq!(majority_extension(dir.path()).unwrap(), ".tif");
    }

    #[test]
    fn test_majority_extension_tie_goes_to_first_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["b.tif", "a.png", "c.tif", "d.png"]);
        assert_eq!(majority_extension(dir.path()).unwrap(), ".png");
    }

    #[test]
    fn test_majority_extension_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png"]);
        for sub in ["x.tif", "y.tif"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        assert_eq!(majority_extension(dir.path()).unwrap(), ".png");
    }

    #[test]
    fn test_empty_directory_has_no_majority() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            majority_extension(dir.path()),
            Err(FocusError::EmptyObjectDir(_))
        ));
    }

    #[test]
    fn test_macro_text() {
        let text = macro_text(Path::new("/out/slide07/slide07_obj00001"), ".tif", 11);
        let expected = "setBatchMode(true);\n\
            run(\"Image Sequence...\", \"open=/out/slide07/slide07_obj00001 \
            file=[.tif] convert sort\");\n\
            run(\"Stack Focuser \", \"enter=11\");\n\
            selectWindow(\"Focused_slide07_obj00001\");\n\
            saveAs(\"Tiff\",\"/out/slide07/slide07_obj00001/ij_focused.tif\");\n\
            close(\"*\");\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_window_name_stops_at_first_dot() {
        let text = macro_text(Path::new("/out/YPM.IP.1_obj00002"), ".png", 7);
        assert!(text.contains("selectWindow(\"Focused_YPM\");"));
    }

    #[test]
    fn test_write_macro_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["p0.tif", "p1.tif"]);
        fs::write(dir.path().join(MACRO_FILE_NAME), "stale").unwrap();

        let path = write_macro(dir.path(), 5).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("file=[.tif]"));
        assert!(text.contains("enter=5"));
    }

    #[test]
    fn test_even_or_zero_kernel_is_rejected() {
        assert!(check_kernel_size(11).is_ok());
        assert!(matches!(check_kernel_size(10), Err(FocusError::InvalidKernelSize(10))));
        assert!(check_kernel_size(0).is_err());
    }
}
