//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through
//! this trait so workflows can be tested without spawning real processes.

use crate::HalResult;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// External command runner trait.
///
/// Synchronous and blocking: the call returns only once the process has
/// exited; there is no per-command timeout or cancellation. A non-zero
/// exit status is reported as [`crate::HalError::CommandFailed`] carrying
/// the exit code and stderr.
pub trait ProcessOps {
    fn run_command(&self, program: &str, args: &[&str]) -> HalResult<CommandOutput>;
}
