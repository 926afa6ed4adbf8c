// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::ids::stage;
use tempfile::tempdir;

#[test]
fn ingest_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let repo = ItemRepository::open(dir.path()).unwrap();
    let id = ItemId::new("a");
    repo.ingest(id.clone(), vec![1, 2, 3]).unwrap();

    let item = repo.get(&id).unwrap();
    assert_eq!(item.raw_payload, vec![1, 2, 3]);
    assert_eq!(item.version, 0);
}

#[test]
fn set_flag_with_correct_version_bumps_version() {
    let dir = tempdir().unwrap();
    let repo = ItemRepository::open(dir.path()).unwrap();
    let id = ItemId::new("a");
    repo.ingest(id.clone(), vec![]).unwrap();

    repo.set_flag(&id, StageId::new(stage::CACHE), 0).unwrap();
    let item = repo.get(&id).unwrap();
    assert!(item.flags.cached);
    assert_eq!(item.version, 1);
}

#[test]
fn set_flag_with_stale_version_is_rejected() {
    let dir = tempdir().unwrap();
    let repo = ItemRepository::open(dir.path()).unwrap();
    let id = ItemId::new("a");
    repo.ingest(id.clone(), vec![]).unwrap();
    repo.set_flag(&id, StageId::new(stage::CACHE), 0).unwrap();

    let err = repo.set_flag(&id, StageId::new(stage::MEDIA), 0).unwrap_err();
    assert!(matches!(err, StorageError::VersionConflict { .. }));
}

#[test]
fn all_items_are_returned_in_ascending_id_order() {
    let dir = tempdir().unwrap();
    let repo = ItemRepository::open(dir.path()).unwrap();
    repo.ingest(ItemId::new("c"), vec![]).unwrap();
    repo.ingest(ItemId::new("a"), vec![]).unwrap();
    repo.ingest(ItemId::new("b"), vec![]).unwrap();

    let ids: Vec<_> = repo.all().into_iter().map(|i| i.item_id).collect();
    assert_eq!(ids, vec![ItemId::new("a"), ItemId::new("b"), ItemId::new("c")]);
}

#[test]
fn restart_replays_item_wal() {
    let dir = tempdir().unwrap();
    let id = ItemId::new("a");
    {
        let repo = ItemRepository::open(dir.path()).unwrap();
        repo.ingest(id.clone(), vec![9]).unwrap();
        repo.set_flag(&id, StageId::new(stage::CACHE), 0).unwrap();
    }

    let repo = ItemRepository::open(dir.path()).unwrap();
    let item = repo.get(&id).unwrap();
    assert!(item.flags.cached);
    assert_eq!(item.version, 1);
}
