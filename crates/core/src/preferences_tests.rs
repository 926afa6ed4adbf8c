// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn default_preferences_resolve_to_full_pipeline() {
    let d = Preferences::default().into_directives().unwrap();
    assert_eq!(d.run_mode, RunMode::FullPipeline);
    assert_eq!(d.active_stages.len(), 10);
}

#[test]
fn skip_and_force_on_same_stage_is_contradictory() {
    let prefs = Preferences {
        skip: ["cache".to_string()].into_iter().collect(),
        force: ["cache".to_string()].into_iter().collect(),
        ..Default::default()
    };
    assert_eq!(
        prefs.into_directives(),
        Err(PreferencesError::ContradictoryDirectives("cache".to_string()))
    );
}

#[test]
fn force_all_conflicts_with_any_skip() {
    let prefs = Preferences {
        skip: ["cache".to_string()].into_iter().collect(),
        force_all: true,
        ..Default::default()
    };
    assert!(matches!(
        prefs.into_directives(),
        Err(PreferencesError::ContradictoryDirectives(_))
    ));
}

#[test]
fn skip_outside_active_stage_set_is_ignored() {
    let prefs = Preferences {
        run_mode: Some(RunMode::FetchOnly),
        skip: ["git_sync".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let d = prefs.into_directives().unwrap();
    assert_eq!(d.run_mode, RunMode::FetchOnly);
    assert!(d.skip.contains(&StageId::new("git_sync")));
}

#[test]
fn skip_inside_active_stage_set_for_non_full_mode_is_rejected() {
    let prefs = Preferences {
        run_mode: Some(RunMode::FetchOnly),
        skip: ["fetch".to_string()].into_iter().collect(),
        ..Default::default()
    };
    assert!(matches!(
        prefs.into_directives(),
        Err(PreferencesError::IncompatibleSkip(_, _))
    ));
}

#[test]
fn custom_mode_without_stages_is_rejected() {
    let prefs = Preferences { run_mode: Some(RunMode::Custom), ..Default::default() };
    assert_eq!(prefs.into_directives(), Err(PreferencesError::EmptyCustomStageSet));
}

#[test]
fn unknown_stage_name_is_rejected() {
    let prefs = Preferences {
        skip: ["not_a_stage".to_string()].into_iter().collect(),
        ..Default::default()
    };
    assert_eq!(
        prefs.into_directives(),
        Err(PreferencesError::UnknownStage("not_a_stage".to_string()))
    );
}

#[test]
fn unknown_custom_stage_name_is_rejected() {
    let prefs = Preferences {
        run_mode: Some(RunMode::Custom),
        custom_stages: ["not_a_stage".to_string()].into_iter().collect(),
        ..Default::default()
    };
    assert_eq!(
        prefs.into_directives(),
        Err(PreferencesError::UnknownStage("not_a_stage".to_string()))
    );
}

#[test]
fn force_all_expands_to_every_stage() {
    let prefs = Preferences { force_all: true, ..Default::default() };
    let d = prefs.into_directives().unwrap();
    assert_eq!(d.force.len(), 10);
}

#[test]
fn fail_fast_defaults_to_false_and_carries_through() {
    let d = Preferences::default().into_directives().unwrap();
    assert!(!d.fail_fast);

    let prefs = Preferences { fail_fast: true, ..Default::default() };
    let d = prefs.into_directives().unwrap();
    assert!(d.fail_fast);
}
