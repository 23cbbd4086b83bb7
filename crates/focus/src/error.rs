use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Focus driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(#[from] stack_common::StackKitError),

    #[error("Unsupported platform {os} ({pointer_width}-bit): no Fiji executable is known for it")]
    UnsupportedPlatform { os: String, pointer_width: u32 },

    #[error("Kernel size must be a positive odd number, got {0}")]
    InvalidKernelSize(u32),

    #[error("Object directory {} contains no files", .0.display())]
    EmptyObjectDir(PathBuf),

    #[error("No object directories found under {}", .0.display())]
    NoObjects(PathBuf),

    #[error("Fiji didn't create files, {} is missing. Perhaps something went wrong?", .0.display())]
    NeverStarted(PathBuf),

    #[error(
        "Fiji didn't finish creating files, {} is missing. Perhaps something went wrong?",
        .0.display()
    )]
    DidNotFinish(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FocusError>;
