//! Error types for the gate.

use thiserror::Error;

/// Failures that prevent the gate from reaching a real classification.
///
/// Every variant blocks the commit. `Flagged` content is not an error; it is
/// a successful classification, carried in
/// [`Classification::Flagged`](crate::scan::Classification::Flagged).
#[derive(Error, Debug)]
pub enum GateError {
    /// The staged changes could not be enumerated (not a git repository,
    /// corrupt index, git itself failing).
    #[error("cannot read staged changes: {reason}")]
    ContentUnavailable { reason: String },

    /// The secret scanner could not produce a verdict: binary missing, not
    /// executable, or killed after exceeding the timeout.
    #[error("scanner `{command}` unavailable: {reason}")]
    ToolUnavailable { command: String, reason: String },

    /// Hook installation failed.
    #[error("hook install failed: {reason}")]
    Install { reason: String },
}
