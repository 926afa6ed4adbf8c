// SPDX-License-Identifier: MIT

//! C4: Item Repository — the sole durable owner of [`Item`] state. Stage
//! handlers request scoped updates through here only (spec.md §3.2).

use crate::errors::StorageError;
use crate::snapshot;
use crate::state::ItemState;
use crate::wal::Wal;
use parking_lot::Mutex;
use spindle_core::{Item, ItemDerived, ItemEvent, ItemId, StageId};
use std::path::{Path, PathBuf};

struct Inner {
    wal: Wal<ItemEvent>,
    state: ItemState,
    snapshot_path: PathBuf,
}

/// Versioned, optimistically-concurrent item store. Every write carries
/// the version it expects to find; mismatches are rejected rather than
/// silently overwritten (spec.md §5 shared-resource policy).
pub struct ItemRepository {
    inner: Mutex<Inner>,
}

impl ItemRepository {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        let snapshot_path = dir.join("items.snapshot.json");
        let mut state = ItemState::default();
        let mut processed_seq = 0;
        if let Some(snap) = snapshot::load::<ItemState>(&snapshot_path)? {
            state = snap.state;
            processed_seq = snap.seq;
        }

        let mut wal: Wal<ItemEvent> = Wal::open(dir.join("items.wal"), processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self { inner: Mutex::new(Inner { wal, state, snapshot_path }) })
    }

    fn commit(&self, inner: &mut Inner, event: ItemEvent) -> Result<(), StorageError> {
        inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply(&event);
        Ok(())
    }

    pub fn ingest(&self, item_id: ItemId, raw_payload: Vec<u8>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, ItemEvent::ItemIngested { item_id, raw_payload })
    }

    /// Sets the flag for `stage` on `item_id`, provided `expected_version`
    /// matches the item's current version.
    pub fn set_flag(&self, item_id: &ItemId, stage: StageId, expected_version: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.check_version(&inner.state, item_id, expected_version)?;
        self.commit(&mut inner, ItemEvent::ItemFlagSet { item_id: item_id.clone(), stage, expected_version })
    }

    pub fn update_derived(&self, item_id: &ItemId, derived: ItemDerived, expected_version: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.check_version(&inner.state, item_id, expected_version)?;
        self.commit(&mut inner, ItemEvent::ItemDerivedUpdated { item_id: item_id.clone(), derived, expected_version })
    }

    fn check_version(&self, state: &ItemState, item_id: &ItemId, expected_version: u64) -> Result<(), StorageError> {
        let item = state.items.get(item_id).ok_or_else(|| StorageError::ItemNotFound(item_id.clone()))?;
        if item.version != expected_version {
            return Err(StorageError::VersionConflict { item_id: item_id.clone(), expected: expected_version, actual: item.version });
        }
        Ok(())
    }

    pub fn get(&self, item_id: &ItemId) -> Option<Item> {
        self.inner.lock().state.items.get(item_id).cloned()
    }

    /// All items in ascending `item_id` order, the deterministic iteration
    /// order the Planner requires (spec.md §4.4).
    pub fn all(&self) -> Vec<Item> {
        self.inner.lock().state.items.values().cloned().collect()
    }

    pub fn checkpoint(&self, now_ms: u64) -> Result<(), StorageError> {
        let inner = self.inner.lock();
        let seq = inner.wal.write_seq();
        snapshot::save(&inner.snapshot_path, seq, &inner.state, now_ms)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "item_repository_tests.rs"]
mod tests;
