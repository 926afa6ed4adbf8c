// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::ids::StageId;
use spindle_core::preferences::Preferences;
use spindle_core::task::TaskKind;
use spindle_core::TaskId;

fn new_task_state_with(id: &TaskId) -> TaskState {
    let mut state = TaskState::default();
    apply(
        &mut state,
        &TaskEvent::TaskCreated { id: id.clone(), kind: TaskKind::FullPipeline, preferences: Preferences::default(), created_at_ms: 10 },
    );
    state
}

#[test]
fn created_task_becomes_the_active_task() {
    let id = TaskId::new();
    let state = new_task_state_with(&id);
    assert_eq!(state.active_task_id, Some(id.clone()));
    assert_eq!(state.tasks.get(&id).unwrap().status, TaskStatus::Pending);
}

#[test]
fn terminal_task_rejects_further_phase_events() {
    let id = TaskId::new();
    let mut state = new_task_state_with(&id);
    apply(&mut state, &TaskEvent::TaskSucceeded { id: id.clone(), completed_at_ms: 100, result_summary: None });
    assert!(state.active_task_id.is_none());

    apply(
        &mut state,
        &TaskEvent::PhaseStarted { id: id.clone(), stage: StageId::new("fetch"), items_total: 5, started_at_ms: 200 },
    );
    assert!(state.tasks.get(&id).unwrap().phase_states.is_empty());
}

#[test]
fn terminal_task_rejects_progress_completion_skip_fail_and_log_events() {
    let id = TaskId::new();
    let mut state = new_task_state_with(&id);
    apply(&mut state, &TaskEvent::TaskFailed { id: id.clone(), completed_at_ms: 100, error_kind: spindle_core::task::ErrorKind::FatalHandler, error_message: "boom".to_string(), error_trace: None });

    let stage = StageId::new("cache");
    apply(&mut state, &TaskEvent::PhaseProgressed { id: id.clone(), stage: stage.clone(), succeeded_delta: 1, failed_delta: 0, skipped_delta: 0 });
    apply(&mut state, &TaskEvent::PhaseCompleted { id: id.clone(), stage: stage.clone(), finished_at_ms: 110 });
    apply(&mut state, &TaskEvent::PhaseSkipped { id: id.clone(), stage: stage.clone() });
    apply(&mut state, &TaskEvent::PhaseFailed { id: id.clone(), stage, finished_at_ms: 110, message: "late".to_string() });
    assert!(state.tasks.get(&id).unwrap().phase_states.is_empty());

    apply(
        &mut state,
        &TaskEvent::LogAppended {
            id: id.clone(),
            sequence: 1,
            timestamp_ms: 110,
            level: spindle_core::LogLevel::Info,
            component: "worker".to_string(),
            phase_id: None,
            message: "too late".to_string(),
        },
    );
    assert!(state.logs.get(&id).is_none());
}

#[test]
fn success_sets_completed_at_and_full_progress() {
    let id = TaskId::new();
    let mut state = new_task_state_with(&id);
    apply(&mut state, &TaskEvent::TaskStarted { id: id.clone(), started_at_ms: 10 });
    apply(&mut state, &TaskEvent::TaskSucceeded { id: id.clone(), completed_at_ms: 50, result_summary: Some("ok".into()) });

    let task = state.tasks.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.progress_percent, 100);
    assert_eq!(task.completed_at_ms, Some(50));
    assert_eq!(task.duration_ms, Some(40));
    assert!(!task.is_active);
}

#[test]
fn log_sequence_is_tracked_per_task() {
    let id = TaskId::new();
    let mut state = new_task_state_with(&id);
    apply(
        &mut state,
        &TaskEvent::LogAppended {
            id: id.clone(),
            sequence: 1,
            timestamp_ms: 10,
            level: spindle_core::LogLevel::Info,
            component: "worker".to_string(),
            phase_id: None,
            message: "starting".to_string(),
        },
    );
    assert_eq!(state.log_sequences.get(&id), Some(&1));
    assert_eq!(state.logs.get(&id).unwrap().len(), 1);
}

#[test]
fn cancel_then_cancelled_clears_active_pointer() {
    let id = TaskId::new();
    let mut state = new_task_state_with(&id);
    apply(&mut state, &TaskEvent::CancelRequested { id: id.clone(), requested_at_ms: 5 });
    assert!(state.tasks.get(&id).unwrap().cancel_requested);

    apply(&mut state, &TaskEvent::TaskCancelled { id: id.clone(), completed_at_ms: 6 });
    assert!(state.active_task_id.is_none());
    assert_eq!(state.tasks.get(&id).unwrap().status, TaskStatus::Cancelled);
}
