// SPDX-License-Identifier: MIT

//! Boundary error for the Task Controller, Worker, and Reaper.

use spindle_bus::BusError;
use spindle_core::preferences::PreferencesError;
use spindle_core::TaskId;
use spindle_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid preferences: {0}")]
    InvalidPreferences(#[from] PreferencesError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("failed to (de)serialize task envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("task {0} already reached a terminal state")]
    TaskTerminal(TaskId),
}
