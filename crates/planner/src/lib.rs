// SPDX-License-Identifier: MIT

//! C5: the Phase Planner. A single pure function from `(items, directives)`
//! to an [`ExecutionPlan`] — no I/O, no `&mut`, no randomness, grounded on
//! the teacher's small-pure-functions-return-data idiom (there: `Vec<Effect>`
//! from a step function; here: `ExecutionPlan` from `plan`).

use spindle_core::ids::stage;
use spindle_core::plan::{ExecutionPlan, IneligibleReason, StagePlan};
use spindle_core::{Directives, Item, ItemId, ItemFlags, StageId};
use std::collections::BTreeMap;

/// One stage's position in the dependency DAG: the flag it sets on an item
/// once processed, and the flag that must already be set for an item to be
/// eligible (`None` for the first stage in the chain).
struct StageSpec {
    id: &'static str,
    owns_flag: Option<fn(&ItemFlags) -> bool>,
    prerequisite: Option<(fn(&ItemFlags) -> bool, IneligibleReason)>,
    per_item: bool,
}

fn stage_specs() -> Vec<StageSpec> {
    vec![
        StageSpec { id: stage::FETCH, owns_flag: None, prerequisite: None, per_item: false },
        StageSpec { id: stage::CACHE, owns_flag: Some(|f| f.cached), prerequisite: None, per_item: true },
        StageSpec {
            id: stage::MEDIA,
            owns_flag: Some(|f| f.media_done),
            prerequisite: Some((|f| f.cached, IneligibleReason::MissingCache)),
            per_item: true,
        },
        StageSpec {
            id: stage::CATEGORIZE,
            owns_flag: Some(|f| f.categorized),
            prerequisite: Some((|f| f.media_done, IneligibleReason::MissingMedia)),
            per_item: true,
        },
        StageSpec {
            id: stage::GENERATE,
            owns_flag: Some(|f| f.generated),
            prerequisite: Some((|f| f.categorized, IneligibleReason::MissingCategory)),
            per_item: true,
        },
        StageSpec {
            id: stage::DB_SYNC,
            owns_flag: Some(|f| f.db_synced),
            prerequisite: Some((|f| f.generated, IneligibleReason::MissingGenerated)),
            per_item: true,
        },
        StageSpec { id: stage::SYNTHESIZE, owns_flag: None, prerequisite: None, per_item: false },
        StageSpec {
            id: stage::EMBED,
            owns_flag: Some(|f| f.embedded),
            prerequisite: Some((|f| f.generated, IneligibleReason::MissingGenerated)),
            per_item: true,
        },
        StageSpec { id: stage::README, owns_flag: None, prerequisite: None, per_item: false },
        StageSpec { id: stage::GIT_SYNC, owns_flag: None, prerequisite: None, per_item: false },
    ]
}

/// Per-item stages reachable downstream of `forced_stage`, inclusive — the
/// set whose stored flag is no longer trustworthy once `forced_stage` is
/// forced, since its output will be recomputed (spec.md §4.5 cascading
/// force semantics). `db_sync` and `embed` both branch off `generate` and
/// don't invalidate each other.
fn downstream_of(forced_stage: &str) -> &'static [&'static str] {
    match forced_stage {
        s if s == stage::CACHE => &[stage::CACHE, stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED],
        s if s == stage::MEDIA => &[stage::MEDIA, stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED],
        s if s == stage::CATEGORIZE => &[stage::CATEGORIZE, stage::GENERATE, stage::DB_SYNC, stage::EMBED],
        s if s == stage::GENERATE => &[stage::GENERATE, stage::DB_SYNC, stage::EMBED],
        s if s == stage::DB_SYNC => &[stage::DB_SYNC],
        s if s == stage::EMBED => &[stage::EMBED],
        _ => &[],
    }
}

/// Builds the deterministic per-stage partition of every item: which need
/// processing for a stage, which are already done, and which are blocked
/// with a diagnosable reason (spec.md §4.5).
///
/// Pure: the only inputs are `items` and `directives`; the only output is
/// the returned plan. Ties are broken by `ItemId` ascending, which falls
/// out for free from `BTreeMap`/`BTreeSet` iteration order.
pub fn plan(items: &BTreeMap<ItemId, Item>, directives: &Directives) -> ExecutionPlan {
    let mut invalidated: std::collections::BTreeSet<&'static str> = std::collections::BTreeSet::new();
    for forced_stage in &directives.force {
        for downstream in downstream_of(forced_stage.as_str()) {
            invalidated.insert(downstream);
        }
    }

    let mut stages = BTreeMap::new();
    let mut order = Vec::new();

    for spec in stage_specs() {
        let stage_id = StageId::new(spec.id);
        order.push(stage_id.clone());
        let mut stage_plan = StagePlan::default();

        if !directives.is_active(&stage_id) {
            stages.insert(stage_id, stage_plan);
            continue;
        }

        if directives.is_skipped(&stage_id) {
            for item_id in items.keys() {
                stage_plan.ineligible.insert(item_id.clone(), IneligibleReason::SkippedByDirective);
            }
            stages.insert(stage_id, stage_plan);
            continue;
        }

        let forced = directives.is_forced(&stage_id) || invalidated.contains(spec.id);

        if !spec.per_item {
            // Aggregate stages (fetch/synthesize/readme/git_sync) run at
            // most once per task, gated on there being any items at all
            // (or being forced), not on a per-item flag.
            if forced || !items.is_empty() {
                stage_plan.needs_processing = items.keys().cloned().collect();
            }
            stages.insert(stage_id, stage_plan);
            continue;
        }

        let owns_flag = spec.owns_flag.expect("per-item stage always owns a flag");
        for (item_id, item) in items {
            if !forced && owns_flag(&item.flags) {
                stage_plan.already_complete.insert(item_id.clone());
                continue;
            }
            match spec.prerequisite {
                Some((prereq, reason)) if !prereq(&item.flags) => {
                    stage_plan.ineligible.insert(item_id.clone(), reason);
                }
                _ => {
                    stage_plan.needs_processing.insert(item_id.clone());
                }
            }
        }

        stages.insert(stage_id, stage_plan);
    }

    ExecutionPlan { stages, order }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

#[cfg(test)]
mod proptests;
