// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn item_ids_preserve_external_value() {
    let id = ItemId::new("tweet-12345");
    assert_eq!(id.as_str(), "tweet-12345");
}

#[test]
fn item_ids_order_lexicographically() {
    let mut ids = vec![ItemId::new("c"), ItemId::new("a"), ItemId::new("b")];
    ids.sort();
    assert_eq!(ids, vec![ItemId::new("a"), ItemId::new("b"), ItemId::new("c")]);
}

#[test]
fn stage_full_order_matches_dependency_chain() {
    assert_eq!(stage::FULL_ORDER.first(), Some(&stage::FETCH));
    assert_eq!(stage::FULL_ORDER.last(), Some(&stage::GIT_SYNC));
    assert_eq!(stage::FULL_ORDER.len(), 10);
}

#[test]
fn task_ids_are_distinct() {
    let a = TaskId::new();
    let b = TaskId::new();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("tsk-"));
}
