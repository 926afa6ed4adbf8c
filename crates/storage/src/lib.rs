// SPDX-License-Identifier: MIT

//! Durable storage layer: write-ahead log, materialized state, the Task
//! Store (C2), and the Item Repository (C4).

mod errors;
mod item_repository;
mod snapshot;
mod state;
mod task_store;
mod wal;

pub use errors::StorageError;
pub use item_repository::ItemRepository;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{ItemState, TaskState};
pub use task_store::TaskStore;
pub use wal::{Wal, WalEntry, WalError};
