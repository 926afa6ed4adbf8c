// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::events::{ItemEvent, TaskEvent};
use crate::ids::{ItemId, TaskId};
use crate::preferences::Preferences;
use crate::task::TaskKind;

/// Proptest strategies for core state machine types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::ids::ItemId;
    use crate::item::ItemFlags;
    use proptest::prelude::*;

    pub fn arb_item_flags() -> impl Strategy<Value = ItemFlags> {
        any::<bool>().prop_flat_map(|_| {
            (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
                |(cached, media_done, categorized, generated, db_synced, embedded)| ItemFlags {
                    cached,
                    media_done,
                    categorized,
                    generated,
                    db_synced,
                    embedded,
                },
            )
        })
    }

    pub fn arb_item_id() -> impl Strategy<Value = ItemId> {
        "[a-z]{1,8}-[0-9]{1,6}".prop_map(ItemId::new)
    }
}

pub fn task_created_event(id: &str, kind: TaskKind) -> TaskEvent {
    TaskEvent::TaskCreated {
        id: TaskId::from_string(id),
        kind,
        preferences: Preferences::default(),
        created_at_ms: 1_000_000,
    }
}

pub fn task_started_event(id: &str) -> TaskEvent {
    TaskEvent::TaskStarted { id: TaskId::from_string(id), started_at_ms: 1_000_000 }
}

pub fn task_succeeded_event(id: &str) -> TaskEvent {
    TaskEvent::TaskSucceeded { id: TaskId::from_string(id), completed_at_ms: 1_001_000, result_summary: None }
}

pub fn item_ingested_event(item_id: &str, payload: &[u8]) -> ItemEvent {
    ItemEvent::ItemIngested { item_id: ItemId::new(item_id), raw_payload: payload.to_vec() }
}
