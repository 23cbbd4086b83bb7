pub mod fiji;
pub mod platform;

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use fiji::FijiDriver;

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("Failed to initialize driver: {0}")]
    Initialization(String),
    #[error("Invocation failed: {0}")]
    Execution(String),
}

/// Exit status of one external invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InvocationOutcome {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl InvocationOutcome {
    pub fn success() -> Self {
        Self { exit_code: Some(0) }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A backend that turns one object directory's plane sequence into a single
/// focused composite by running a macro script.
///
/// Implementations block until the tool exits. The composite location is
/// named inside the macro, so callers check for it afterwards.
pub trait StackFocuser {
    /// Run the macro at `macro_path`
    fn focus(&self, macro_path: &Path) -> Result<InvocationOutcome, DriverError>;

    /// Name used in logs
    fn description(&self) -> String;
}
