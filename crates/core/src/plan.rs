// SPDX-License-Identifier: MIT

//! The ephemeral artifact produced by the Phase Planner (spec.md §3.1, §4.5).

use crate::ids::{ItemId, StageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Why an item was excluded from a stage's `needs_processing` set without
/// being already complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    MissingCache,
    MissingCategory,
    MissingMedia,
    MissingGenerated,
    SkippedByDirective,
    StageNotActive,
}

crate::simple_display! {
    IneligibleReason {
        MissingCache => "missing_cache",
        MissingCategory => "missing_category",
        MissingMedia => "missing_media",
        MissingGenerated => "missing_generated",
        SkippedByDirective => "skipped_by_directive",
        StageNotActive => "stage_not_active",
    }
}

/// Per-stage partition of the item universe, as of Planner invocation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub needs_processing: BTreeSet<ItemId>,
    pub already_complete: BTreeSet<ItemId>,
    pub ineligible: BTreeMap<ItemId, IneligibleReason>,
}

impl StagePlan {
    pub fn is_empty_of_work(&self) -> bool {
        self.needs_processing.is_empty()
    }
}

/// Immutable, deterministic output of one Planner invocation (spec property 2).
///
/// Recomputed at run start and between stages (spec.md §3.1); never
/// mutated once built. `stages` is keyed by `StageId` for O(log n) lookup,
/// which sorts lexicographically rather than by dependency order, so
/// `order` carries the actual topological sequence the Planner assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub stages: BTreeMap<StageId, StagePlan>,
    pub order: Vec<StageId>,
}

impl ExecutionPlan {
    pub fn stage(&self, id: &StageId) -> Option<&StagePlan> {
        self.stages.get(id)
    }

    /// Every stage in dependency (topological) order, paired with its plan.
    pub fn stages_in_order(&self) -> impl Iterator<Item = (&StageId, &StagePlan)> {
        self.order.iter().filter_map(|id| self.stages.get(id).map(|plan| (id, plan)))
    }

    /// Stages in dependency order that still have outstanding work.
    pub fn stages_with_work(&self) -> impl Iterator<Item = (&StageId, &StagePlan)> {
        self.stages_in_order().filter(|(_, plan)| !plan.is_empty_of_work())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_plan_has_no_work() {
        let plan = ExecutionPlan::default();
        assert_eq!(plan.stages_with_work().count(), 0);
    }

    #[test]
    fn stage_with_needs_processing_is_not_empty() {
        let mut stage_plan = StagePlan::default();
        stage_plan.needs_processing.insert(ItemId::new("a"));
        assert!(!stage_plan.is_empty_of_work());
    }
}
