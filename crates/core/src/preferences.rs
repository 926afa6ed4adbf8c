// SPDX-License-Identifier: MIT

//! User-facing run preferences and their translation into Planner directives.

use crate::ids::{stage, StageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    FullPipeline,
    FetchOnly,
    SynthesisOnly,
    EmbeddingOnly,
    GitOnly,
    Custom,
}

crate::simple_display! {
    RunMode {
        FullPipeline => "full_pipeline",
        FetchOnly => "fetch_only",
        SynthesisOnly => "synthesis_only",
        EmbeddingOnly => "embedding_only",
        GitOnly => "git_only",
        Custom => "custom",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    Comprehensive,
    Technical,
    Practical,
}

impl Default for SynthesisMode {
    fn default() -> Self {
        Self::Comprehensive
    }
}

crate::simple_display! {
    SynthesisMode {
        Comprehensive => "comprehensive",
        Technical => "technical",
        Practical => "practical",
    }
}

/// Raw, user-supplied preferences for a task (spec.md §4.11 Inputs).
///
/// Frozen into the `Task` record verbatim once accepted; validation happens
/// once, at submission time, via [`Preferences::into_directives`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preferences {
    pub run_mode: Option<RunMode>,
    #[serde(default)]
    pub custom_stages: BTreeSet<String>,
    #[serde(default)]
    pub skip: BTreeSet<String>,
    #[serde(default)]
    pub force: BTreeSet<String>,
    #[serde(default)]
    pub force_all: bool,
    #[serde(default)]
    pub synthesis_mode: Option<SynthesisMode>,
    /// Fail the whole stage on the first item error rather than tolerating
    /// partial failure (spec.md §7 transient-handler-error policy).
    #[serde(default)]
    pub fail_fast: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("stage '{0}' in skip and force simultaneously")]
    ContradictoryDirectives(String),
    #[error("skip directive for '{0}' is incompatible with run mode '{1}'")]
    IncompatibleSkip(String, &'static str),
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
    #[error("custom run mode requires at least one stage in custom_stages")]
    EmptyCustomStageSet,
}

/// Validated, immutable output of preference resolution, consumed by the
/// Planner (spec.md §4.11 Output). Unlike [`Preferences`], every field here
/// is guaranteed internally consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    pub run_mode: RunMode,
    pub active_stages: BTreeSet<StageId>,
    pub skip: BTreeSet<StageId>,
    pub force: BTreeSet<StageId>,
    pub synthesis_mode: SynthesisMode,
    pub fail_fast: bool,
}

impl Directives {
    pub fn is_skipped(&self, stage: &StageId) -> bool {
        self.skip.contains(stage)
    }

    pub fn is_forced(&self, stage: &StageId) -> bool {
        self.force.contains(stage)
    }

    pub fn is_active(&self, stage: &StageId) -> bool {
        self.active_stages.contains(stage)
    }
}

fn stage_set_for(mode: RunMode, custom: &BTreeSet<String>) -> BTreeSet<StageId> {
    match mode {
        RunMode::FullPipeline => stage::FULL_ORDER.iter().map(|s| StageId::new(*s)).collect(),
        RunMode::FetchOnly => [StageId::new(stage::FETCH)].into_iter().collect(),
        RunMode::SynthesisOnly => [StageId::new(stage::SYNTHESIZE)].into_iter().collect(),
        RunMode::EmbeddingOnly => [StageId::new(stage::EMBED)].into_iter().collect(),
        RunMode::GitOnly => [StageId::new(stage::GIT_SYNC)].into_iter().collect(),
        RunMode::Custom => custom.iter().map(|s| StageId::new(s.as_str())).collect(),
    }
}

impl Preferences {
    /// Validates and resolves raw preferences into [`Directives`].
    ///
    /// This is the sole entry point C11 exposes; the Planner never sees
    /// unresolved `Preferences`.
    pub fn into_directives(self) -> Result<Directives, PreferencesError> {
        let run_mode = self.run_mode.unwrap_or(RunMode::FullPipeline);

        for s in self.skip.iter().chain(self.force.iter()).chain(self.custom_stages.iter()) {
            if !stage::FULL_ORDER.contains(&s.as_str()) {
                return Err(PreferencesError::UnknownStage(s.clone()));
            }
        }

        if run_mode == RunMode::Custom && self.custom_stages.is_empty() {
            return Err(PreferencesError::EmptyCustomStageSet);
        }

        let active_stages = stage_set_for(run_mode, &self.custom_stages);

        if run_mode != RunMode::FullPipeline {
            for s in &self.skip {
                if !active_stages.contains(&StageId::new(s.as_str())) {
                    continue;
                }
                return Err(PreferencesError::IncompatibleSkip(s.clone(), run_mode_name(run_mode)));
            }
        }

        if self.force_all && !self.skip.is_empty() {
            return Err(PreferencesError::ContradictoryDirectives(
                self.skip.iter().next().cloned().unwrap_or_default(),
            ));
        }
        for s in &self.skip {
            if self.force.contains(s) {
                return Err(PreferencesError::ContradictoryDirectives(s.clone()));
            }
        }

        let force: BTreeSet<StageId> = if self.force_all {
            stage::FULL_ORDER.iter().map(|s| StageId::new(*s)).collect()
        } else {
            self.force.iter().map(|s| StageId::new(s.as_str())).collect()
        };
        let skip: BTreeSet<StageId> = self.skip.iter().map(|s| StageId::new(s.as_str())).collect();

        Ok(Directives {
            run_mode,
            active_stages,
            skip,
            force,
            synthesis_mode: self.synthesis_mode.unwrap_or_default(),
            fail_fast: self.fail_fast,
        })
    }
}

fn run_mode_name(mode: RunMode) -> &'static str {
    match mode {
        RunMode::FullPipeline => "full_pipeline",
        RunMode::FetchOnly => "fetch_only",
        RunMode::SynthesisOnly => "synthesis_only",
        RunMode::EmbeddingOnly => "embedding_only",
        RunMode::GitOnly => "git_only",
        RunMode::Custom => "custom",
    }
}

#[cfg(test)]
#[path = "preferences_tests.rs"]
mod tests;
