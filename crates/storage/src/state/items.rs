// SPDX-License-Identifier: MIT

//! Item event handlers.

use super::ItemState;
use spindle_core::item::Item;
use spindle_core::ids::stage;
use spindle_core::ItemEvent;

pub(crate) fn apply(state: &mut ItemState, event: &ItemEvent) {
    match event {
        ItemEvent::ItemIngested { item_id, raw_payload } => {
            state.items.entry(item_id.clone()).or_insert_with(|| Item::new(item_id.clone(), raw_payload.clone()));
        }

        ItemEvent::ItemFlagSet { item_id, stage: stage_id, expected_version } => {
            let Some(item) = state.items.get_mut(item_id) else { return };
            if item.version != *expected_version {
                // Stale write replayed out of order or retried after a
                // concurrent update already landed; idempotently ignored.
                return;
            }
            set_flag(item, stage_id.as_str());
            item.version += 1;
        }

        ItemEvent::ItemDerivedUpdated { item_id, derived, expected_version } => {
            let Some(item) = state.items.get_mut(item_id) else { return };
            if item.version != *expected_version {
                return;
            }
            item.derived = derived.clone();
            item.version += 1;
        }
    }
}

fn set_flag(item: &mut Item, stage_name: &str) {
    match stage_name {
        s if s == stage::CACHE => item.flags.cached = true,
        s if s == stage::MEDIA => item.flags.media_done = true,
        s if s == stage::CATEGORIZE => item.flags.categorized = true,
        s if s == stage::GENERATE => item.flags.generated = true,
        s if s == stage::DB_SYNC => item.flags.db_synced = true,
        s if s == stage::EMBED => item.flags.embedded = true,
        _ => {}
    }
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
