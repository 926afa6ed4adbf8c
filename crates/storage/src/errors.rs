// SPDX-License-Identifier: MIT

use crate::wal::WalError;
use crate::snapshot::SnapshotError;
use spindle_core::ItemId;
use spindle_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("another task is already active: {0}")]
    TaskAlreadyActive(TaskId),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("task {0} has already reached a terminal state")]
    TaskTerminal(TaskId),
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    #[error("optimistic write to item {item_id} rejected: expected version {expected}, found {actual}")]
    VersionConflict { item_id: ItemId, expected: u64, actual: u64 },
    #[error("write-ahead log error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}
