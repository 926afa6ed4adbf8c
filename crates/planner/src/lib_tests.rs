// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::preferences::Preferences;
use spindle_core::ItemFlags;

fn item(id: &str, flags: ItemFlags) -> (ItemId, Item) {
    let item_id = ItemId::new(id);
    let mut it = Item::new(item_id.clone(), Vec::new());
    it.flags = flags;
    (item_id, it)
}

fn full_pipeline_directives() -> Directives {
    Preferences::default().into_directives().unwrap()
}

#[test]
fn fresh_items_need_processing_at_cache_only_in_this_one_snapshot() {
    // A single `plan()` call only ever sees the flags passed in — it
    // never recomputes downstream eligibility within itself. Categorize
    // reads as ineligible here because `media_done` is still false in
    // *this* snapshot, not because the pipeline can never reach it: once
    // the caller re-plans after `cache`'s handler sets `cached`, the next
    // snapshot marks `media` eligible, and so on down the chain (see
    // `recomputing_after_each_stage_advances_eligibility_down_the_chain`).
    let items = BTreeMap::from([item("a", ItemFlags::default())]);
    let result = plan(&items, &full_pipeline_directives());

    let cache = result.stage(&StageId::new(stage::CACHE)).unwrap();
    assert!(cache.needs_processing.contains(&ItemId::new("a")));

    let categorize = result.stage(&StageId::new(stage::CATEGORIZE)).unwrap();
    assert!(categorize.ineligible.contains_key(&ItemId::new("a")));
}

#[test]
fn recomputing_after_each_stage_advances_eligibility_down_the_chain() {
    let directives = full_pipeline_directives();
    let mut items = BTreeMap::from([item("a", ItemFlags::default())]);

    for (flag, stage_name) in [
        (|f: &mut ItemFlags| f.cached = true, stage::MEDIA),
        (|f: &mut ItemFlags| f.media_done = true, stage::CATEGORIZE),
        (|f: &mut ItemFlags| f.categorized = true, stage::GENERATE),
        (|f: &mut ItemFlags| f.generated = true, stage::DB_SYNC),
    ] {
        let result = plan(&items, &directives);
        let next_stage = result.stage(&StageId::new(stage_name)).unwrap();
        assert!(next_stage.ineligible.contains_key(&ItemId::new("a")), "{stage_name} should still be ineligible before this round's flag lands");

        flag(&mut items.get_mut(&ItemId::new("a")).unwrap().flags);

        let result = plan(&items, &directives);
        let next_stage = result.stage(&StageId::new(stage_name)).unwrap();
        assert!(next_stage.needs_processing.contains(&ItemId::new("a")), "{stage_name} should become eligible once its prerequisite flag is set");
    }
}

#[test]
fn fully_processed_item_is_already_complete_everywhere() {
    let flags = ItemFlags { cached: true, media_done: true, categorized: true, generated: true, db_synced: true, embedded: true };
    let items = BTreeMap::from([item("a", flags)]);
    let result = plan(&items, &full_pipeline_directives());

    for stage_name in [stage::CACHE, stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED] {
        let stage_plan = result.stage(&StageId::new(stage_name)).unwrap();
        assert!(stage_plan.already_complete.contains(&ItemId::new("a")), "stage {stage_name} should be complete");
    }
}

#[test]
fn skip_directive_marks_item_ineligible_with_reason() {
    let mut prefs = Preferences::default();
    prefs.skip.insert(stage::MEDIA.to_string());
    let directives = prefs.into_directives().unwrap();

    let items = BTreeMap::from([item("a", ItemFlags { cached: true, ..Default::default() })]);
    let result = plan(&items, &directives);

    let media = result.stage(&StageId::new(stage::MEDIA)).unwrap();
    assert_eq!(media.ineligible.get(&ItemId::new("a")), Some(&IneligibleReason::SkippedByDirective));
}

#[test]
fn force_on_already_complete_item_overrides_its_own_flag() {
    let mut prefs = Preferences::default();
    prefs.force.insert(stage::CATEGORIZE.to_string());
    let directives = prefs.into_directives().unwrap();

    let flags = ItemFlags { cached: true, media_done: true, categorized: true, ..Default::default() };
    let items = BTreeMap::from([item("a", flags)]);
    let result = plan(&items, &directives);

    let categorize = result.stage(&StageId::new(stage::CATEGORIZE)).unwrap();
    assert!(categorize.needs_processing.contains(&ItemId::new("a")));
}

#[test]
fn forcing_an_upstream_stage_cascades_to_downstream_flags() {
    let mut prefs = Preferences::default();
    prefs.force.insert(stage::CACHE.to_string());
    let directives = prefs.into_directives().unwrap();

    let flags = ItemFlags { cached: true, media_done: true, categorized: true, generated: true, db_synced: true, embedded: true };
    let items = BTreeMap::from([item("a", flags)]);
    let result = plan(&items, &directives);

    for stage_name in [stage::CACHE, stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED] {
        let stage_plan = result.stage(&StageId::new(stage_name)).unwrap();
        assert!(stage_plan.needs_processing.contains(&ItemId::new("a")), "stage {stage_name} should cascade");
    }
}

#[test]
fn fetch_only_mode_restricts_active_stages_to_fetch() {
    let mut prefs = Preferences::default();
    prefs.run_mode = Some(spindle_core::preferences::RunMode::FetchOnly);
    let directives = prefs.into_directives().unwrap();

    let items = BTreeMap::from([item("a", ItemFlags::default())]);
    let result = plan(&items, &directives);

    assert!(result.stage(&StageId::new(stage::FETCH)).unwrap().needs_processing.contains(&ItemId::new("a")));
    assert!(result.stage(&StageId::new(stage::MEDIA)).unwrap().is_empty_of_work());
}

#[test]
fn aggregate_stage_runs_once_when_items_are_present() {
    let items = BTreeMap::from([item("a", ItemFlags::default()), item("b", ItemFlags::default())]);
    let result = plan(&items, &full_pipeline_directives());

    let synthesize = result.stage(&StageId::new(stage::SYNTHESIZE)).unwrap();
    assert_eq!(synthesize.needs_processing.len(), 2);
}

#[test]
fn plan_is_deterministic_for_the_same_inputs() {
    let items = BTreeMap::from([item("b", ItemFlags::default()), item("a", ItemFlags::default())]);
    let directives = full_pipeline_directives();

    let first = plan(&items, &directives);
    let second = plan(&items, &directives);

    assert_eq!(first.stage(&StageId::new(stage::CACHE)).unwrap().needs_processing, second.stage(&StageId::new(stage::CACHE)).unwrap().needs_processing);
    let ordered: Vec<_> = first.stage(&StageId::new(stage::CACHE)).unwrap().needs_processing.iter().collect();
    assert_eq!(ordered, vec![&ItemId::new("a"), &ItemId::new("b")]);
}

#[test]
fn inactive_stage_has_no_work_at_all() {
    let mut prefs = Preferences::default();
    prefs.run_mode = Some(spindle_core::preferences::RunMode::GitOnly);
    let directives = prefs.into_directives().unwrap();

    let items = BTreeMap::from([item("a", ItemFlags::default())]);
    let result = plan(&items, &directives);

    assert!(result.stage(&StageId::new(stage::CACHE)).unwrap().is_empty_of_work());
    assert!(result.stage(&StageId::new(stage::CACHE)).unwrap().ineligible.is_empty());
}

#[test]
fn empty_item_set_produces_no_work_anywhere() {
    let items: BTreeMap<ItemId, Item> = BTreeMap::new();
    let result = plan(&items, &full_pipeline_directives());
    assert_eq!(result.stages_with_work().count(), 0);
}
