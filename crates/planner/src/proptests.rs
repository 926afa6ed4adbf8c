// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::test_support::strategies::{arb_item_flags, arb_item_id};
use proptest::prelude::*;

fn arb_items() -> impl Strategy<Value = BTreeMap<ItemId, Item>> {
    proptest::collection::vec((arb_item_id(), arb_item_flags()), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(id, flags)| {
                let mut it = Item::new(id.clone(), Vec::new());
                it.flags = flags;
                (id, it)
            })
            .collect()
    })
}

proptest! {
    /// Planner purity: the same `(items, directives)` always produce a
    /// byte-for-byte identical plan (spec property 2).
    #[test]
    fn plan_is_pure(items in arb_items()) {
        let directives = spindle_core::preferences::Preferences::default().into_directives().unwrap();
        let first = plan(&items, &directives);
        let second = plan(&items, &directives);
        prop_assert_eq!(first, second);
    }

    /// Planner correctness: an item marked `already_complete` for stage *S*
    /// has its *S* flag true, unless *S* was forced (spec property 3).
    #[test]
    fn already_complete_items_have_the_stage_flag_set(items in arb_items()) {
        let directives = spindle_core::preferences::Preferences::default().into_directives().unwrap();
        let result = plan(&items, &directives);

        for stage_name in [stage::CACHE, stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED] {
            let stage_plan = result.stage(&StageId::new(stage_name)).unwrap();
            for item_id in &stage_plan.already_complete {
                let item = &items[item_id];
                let owns_flag = stage_specs().into_iter().find(|s| s.id == stage_name).unwrap().owns_flag.unwrap();
                prop_assert!(owns_flag(&item.flags));
            }
        }
    }

    /// Every item appears in exactly one of `needs_processing`,
    /// `already_complete`, `ineligible` for any active, non-skipped,
    /// per-item stage.
    #[test]
    fn per_item_stages_partition_every_item_exactly_once(items in arb_items()) {
        let directives = spindle_core::preferences::Preferences::default().into_directives().unwrap();
        let result = plan(&items, &directives);

        for stage_name in [stage::CACHE, stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED] {
            let stage_plan = result.stage(&StageId::new(stage_name)).unwrap();
            for item_id in items.keys() {
                let in_needs = stage_plan.needs_processing.contains(item_id);
                let in_complete = stage_plan.already_complete.contains(item_id);
                let in_ineligible = stage_plan.ineligible.contains_key(item_id);
                prop_assert_eq!((in_needs as u8) + (in_complete as u8) + (in_ineligible as u8), 1);
            }
        }
    }
}
