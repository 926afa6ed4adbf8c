// SPDX-License-Identifier: MIT

//! The content unit that flows through the pipeline (spec.md §3.1 Item).

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};

/// Per-stage completion flags. Ordering invariants (spec.md §3.1) are
/// enforced by [`ItemRepository`](crate) writers, not by this type itself —
/// it is a plain data carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub media_done: bool,
    #[serde(default)]
    pub categorized: bool,
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub db_synced: bool,
    #[serde(default)]
    pub embedded: bool,
}

impl ItemFlags {
    /// `generated ⇒ categorized ⇒ media_done ⇒ cached`; `embedded ⇒ generated`;
    /// `db_synced ⇒ generated`.
    pub fn is_internally_consistent(&self) -> bool {
        if self.generated && !self.categorized {
            return false;
        }
        if self.categorized && !self.media_done {
            return false;
        }
        if self.media_done && !self.cached {
            return false;
        }
        if self.embedded && !self.generated {
            return false;
        }
        if self.db_synced && !self.generated {
            return false;
        }
        true
    }
}

/// Derived metadata produced by stage handlers as a side effect of
/// processing. All paths are project-root-relative; absolute resolution
/// happens at read time (spec.md §3.1 invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemDerived {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub media_paths: Vec<String>,
    #[serde(default)]
    pub artifact_paths: Vec<String>,
}

/// A content unit the pipeline processes end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub raw_payload: Vec<u8>,
    pub flags: ItemFlags,
    #[serde(default)]
    pub derived: ItemDerived,
    /// Optimistic concurrency token; bumped on every committed write.
    pub version: u64,
}

impl Item {
    pub fn new(item_id: ItemId, raw_payload: Vec<u8>) -> Self {
        Self { item_id, raw_payload, flags: ItemFlags::default(), derived: ItemDerived::default(), version: 0 }
    }

    /// An item is complete iff every flag required by `mandatory` is true.
    pub fn is_complete_for(&self, mandatory: &[fn(&ItemFlags) -> bool]) -> bool {
        mandatory.iter().all(|f| f(&self.flags))
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
