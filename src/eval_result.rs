//! Result types used for evaluation functions.

use crate::error::ShellError;

/// What the shell does after a command has run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Flow {
    /// Read the next line.
    Continue,

    /// Terminate the process with the given status.
    Exit(i32),
}

/// A Result type for the shell's eval functions.
pub type EvalResult = Result<Flow, ShellError>;
