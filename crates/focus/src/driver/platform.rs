//! Fiji ships one launcher per platform; the batch picks it from the host OS
//! and pointer width.

use crate::error::{FocusError, Result};

/// Launcher name for `os` (as in [`std::env::consts::OS`]) and pointer width
pub fn executable_for(os: &str, pointer_width: u32) -> Result<&'static str> {
    match (os, pointer_width) {
        ("macos", _) => Ok("ImageJ-macosx"),
        ("linux", 32) => Ok("ImageJ-linux32"),
        ("linux", 64) => Ok("ImageJ-linux64"),
        _ => Err(FocusError::UnsupportedPlatform {
            os: os.to_string(),
            pointer_width,
        }),
    }
}

/// Launcher name for the running host
pub fn host_executable() -> Result<&'static str> {
    executable_for(std::env::consts::OS, usize::BITS)
}
