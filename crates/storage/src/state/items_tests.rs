// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::ids::StageId;
use spindle_core::ItemId;

#[test]
fn ingest_is_idempotent() {
    let mut state = ItemState::default();
    let id = ItemId::new("a");
    apply(&mut state, &ItemEvent::ItemIngested { item_id: id.clone(), raw_payload: vec![1] });
    apply(&mut state, &ItemEvent::ItemIngested { item_id: id.clone(), raw_payload: vec![2] });

    assert_eq!(state.items.get(&id).unwrap().raw_payload, vec![1]);
}

#[test]
fn flag_set_bumps_version_on_match() {
    let mut state = ItemState::default();
    let id = ItemId::new("a");
    apply(&mut state, &ItemEvent::ItemIngested { item_id: id.clone(), raw_payload: vec![] });

    apply(&mut state, &ItemEvent::ItemFlagSet { item_id: id.clone(), stage: StageId::new("cache"), expected_version: 0 });
    let item = state.items.get(&id).unwrap();
    assert!(item.flags.cached);
    assert_eq!(item.version, 1);
}

#[test]
fn stale_version_flag_set_is_ignored() {
    let mut state = ItemState::default();
    let id = ItemId::new("a");
    apply(&mut state, &ItemEvent::ItemIngested { item_id: id.clone(), raw_payload: vec![] });
    apply(&mut state, &ItemEvent::ItemFlagSet { item_id: id.clone(), stage: StageId::new("cache"), expected_version: 0 });

    // Replaying the same expected_version after the version already advanced
    // must not double-apply the flag transition.
    apply(&mut state, &ItemEvent::ItemFlagSet { item_id: id.clone(), stage: StageId::new("media"), expected_version: 0 });
    let item = state.items.get(&id).unwrap();
    assert!(!item.flags.media_done);
    assert_eq!(item.version, 1);
}
