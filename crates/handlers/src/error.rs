// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Boundary error for `StageHandler::execute`. Maps onto
/// `spindle_core::task::ErrorKind` at the call site (engine layer), which
/// decides retry policy.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("stage cancelled")]
    Cancelled,
    #[error("stage timed out")]
    Timeout,
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("fatal failure: {0}")]
    Fatal(String),
}
