use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::{
    driver::{DriverError, InvocationOutcome, StackFocuser, platform},
    error::Result,
};

pub const DEFAULT_MEMORY: &str = "1000m";

/// Runs Fiji headless with the Stack Focuser plugin
#[derive(Debug, Clone)]
pub struct FijiDriver {
    executable: PathBuf,
    memory: String,
}

impl FijiDriver {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            memory: DEFAULT_MEMORY.to_string(),
        }
    }

    /// Launcher for this host, found on `PATH` at invocation time
    pub fn for_host() -> Result<Self> {
        Ok(Self::new(platform::host_executable()?))
    }

    /// Java heap handed to Fiji, e.g. `1000m` or `4g`
    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = memory.into();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn command(&self, macro_path: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--headless")
            .arg(format!("--memory={}", self.memory))
            .arg("-macro")
            .arg(macro_path);
        cmd
    }
}

impl StackFocuser for FijiDriver {
    fn focus(&self, macro_path: &Path) -> std::result::Result<InvocationOutcome, DriverError> {
        let mut cmd = self.command(macro_path);
        info!("Executing Fiji command: {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            let executable = self.executable.display();
            DriverError::Execution(format!("Failed to execute {executable}: {e}"))
        })?;
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());

        if !output.status.success() {
            warn!(
                "Fiji exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(InvocationOutcome { exit_code: output.status.code() })
    }

    fn description(&self) -> String {
        format!("Fiji ({}, memory {})", self.executable.display(), self.memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_command_line() {
        let driver = FijiDriver::new("ImageJ-linux64").with_memory("2g");
        let cmd = driver.command(Path::new("/out/slide07_obj00001/macro.ijm"));

        assert_eq!(cmd.get_program(), OsStr::new("ImageJ-linux64"));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("--headless"),
                OsStr::new("--memory=2g"),
                OsStr::new("-macro"),
                OsStr::new("/out/slide07_obj00001/macro.ijm"),
            ]
        );
    }

    #[test]
    fn test_missing_executable_is_a_driver_error() {
        let driver = FijiDriver::new("/nonexistent/ImageJ-linux64");
        assert!(matches!(
            driver.focus(Path::new("macro.ijm")),
            Err(DriverError::Execution(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported_not_raised() {
        let driver = FijiDriver::new("false");
        let outcome = driver.focus(Path::new("macro.ijm")).unwrap();
        assert!(!outcome.succeeded());
    }
}
