// SPDX-License-Identifier: MIT

use super::*;

crate::define_id! {
    /// Scratch ID type for exercising the macro in isolation.
    pub struct ScratchId("scr-");
}

#[test]
fn new_ids_carry_the_prefix() {
    let id = ScratchId::new();
    assert!(id.as_str().starts_with("scr-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn round_trips_through_string() {
    let id = ScratchId::new();
    let parsed = ScratchId::from_string(id.as_str());
    assert_eq!(id, parsed);
}

#[test]
fn suffix_strips_prefix() {
    let id = ScratchId::from_string("scr-abc123");
    assert_eq!(id.suffix(), "abc123");
}

#[test]
fn short_truncates_suffix() {
    let id = ScratchId::from_string("scr-abcdefg");
    assert_eq!(id.short(3), "abc");
    assert_eq!(id.short(100), "abcdefg");
}

#[test]
fn ids_are_ordered_lexicographically() {
    let a = ScratchId::from_string("scr-aaaa");
    let b = ScratchId::from_string("scr-bbbb");
    assert!(a < b);
}

#[test]
fn serde_round_trip() {
    let id = ScratchId::from_string("scr-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"scr-xyz\"");
    let back: ScratchId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}
