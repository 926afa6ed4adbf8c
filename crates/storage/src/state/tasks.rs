// SPDX-License-Identifier: MIT

//! Task event handlers.

use super::TaskState;
use spindle_core::phase::PhaseState;
use spindle_core::task::{ErrorKind, TaskStatus};
use spindle_core::{LogEntry, Task, TaskEvent};

pub(crate) fn apply(state: &mut TaskState, event: &TaskEvent) {
    match event {
        TaskEvent::TaskCreated { id, kind, preferences, created_at_ms } => {
            let task = Task::new(id.clone(), *kind, preferences.clone(), *created_at_ms);
            state.active_task_id = Some(id.clone());
            state.tasks.insert(id.clone(), task);
        }

        TaskEvent::TaskEnqueued { id, delivery_id } => {
            if let Some(task) = state.tasks.get_mut(id) {
                task.worker_task_id = Some(delivery_id.to_string());
            }
        }

        TaskEvent::TaskStarted { id, started_at_ms } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                task.status = TaskStatus::Running;
                task.started_at_ms = Some(*started_at_ms);
                task.updated_at_ms = *started_at_ms;
            }
        }

        TaskEvent::PhaseStarted { id, stage, items_total, started_at_ms } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                let mut phase = PhaseState::pending();
                phase.status = spindle_core::phase::PhaseStatus::Running;
                phase.started_at_ms = Some(*started_at_ms);
                phase.items_total = *items_total;
                task.phase_states.insert(stage.as_str().to_string(), phase);
                task.current_phase_id = Some(stage.as_str().to_string());
                task.updated_at_ms = *started_at_ms;
            }
        }

        TaskEvent::PhaseProgressed { id, stage, succeeded_delta, failed_delta, skipped_delta } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                if let Some(phase) = task.phase_states.get_mut(stage.as_str()) {
                    phase.items_succeeded += succeeded_delta;
                    phase.items_failed += failed_delta;
                    phase.items_skipped += skipped_delta;
                }
                task.progress_percent = compute_progress(task);
            }
        }

        TaskEvent::PhaseCompleted { id, stage, finished_at_ms } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                if let Some(phase) = task.phase_states.get_mut(stage.as_str()) {
                    phase.status = spindle_core::phase::PhaseStatus::Success;
                    phase.finished_at_ms = Some(*finished_at_ms);
                }
                task.updated_at_ms = *finished_at_ms;
            }
        }

        TaskEvent::PhaseSkipped { id, stage } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                let phase = task
                    .phase_states
                    .entry(stage.as_str().to_string())
                    .or_insert_with(PhaseState::pending);
                phase.status = spindle_core::phase::PhaseStatus::Skipped;
            }
        }

        TaskEvent::PhaseFailed { id, stage, finished_at_ms, message } => {
            if let Some(task) = state.tasks.get_mut(id) {
                if task.is_terminal() {
                    return;
                }
                if let Some(phase) = task.phase_states.get_mut(stage.as_str()) {
                    phase.status = spindle_core::phase::PhaseStatus::Failed;
                    phase.finished_at_ms = Some(*finished_at_ms);
                    phase.message = Some(message.clone());
                }
                task.updated_at_ms = *finished_at_ms;
            }
        }

        TaskEvent::ProgressUpdated { id, percent, phase_id, message } => {
            if let Some(task) = state.tasks.get_mut(id) {
                task.progress_percent = *percent;
                task.current_phase_id = phase_id.clone();
                task.current_phase_message = message.clone();
            }
        }

        TaskEvent::TaskSucceeded { id, completed_at_ms, result_summary } => {
            finalize(state, id, *completed_at_ms, |task| {
                task.status = TaskStatus::Success;
                task.progress_percent = 100;
                task.result_summary = result_summary.clone();
            });
        }

        TaskEvent::TaskFailed { id, completed_at_ms, error_kind, error_message, error_trace } => {
            finalize(state, id, *completed_at_ms, |task| {
                task.status = TaskStatus::Failed;
                task.error_kind = Some(*error_kind);
                task.error_message = Some(error_message.clone());
                task.error_trace = error_trace.clone();
            });
        }

        TaskEvent::CancelRequested { id, requested_at_ms } => {
            if let Some(task) = state.tasks.get_mut(id) {
                task.cancel_requested = true;
                task.updated_at_ms = *requested_at_ms;
            }
        }

        TaskEvent::TaskCancelled { id, completed_at_ms } => {
            finalize(state, id, *completed_at_ms, |task| {
                task.status = TaskStatus::Cancelled;
                task.error_kind = Some(ErrorKind::Cancelled);
            });
        }

        TaskEvent::TaskRevoked { id, completed_at_ms, reason } => {
            finalize(state, id, *completed_at_ms, |task| {
                task.status = TaskStatus::Revoked;
                task.error_message = Some(reason.clone());
            });
        }

        TaskEvent::TaskArchived { id } => {
            if let Some(task) = state.tasks.get_mut(id) {
                task.is_archived = true;
            }
        }

        TaskEvent::LogAppended { id, sequence, timestamp_ms, level, component, phase_id, message } => {
            if let Some(task) = state.tasks.get(id) {
                if task.is_terminal() {
                    return;
                }
            }
            state.logs.entry(id.clone()).or_default().push(LogEntry {
                task_id: id.clone(),
                sequence: *sequence,
                timestamp_ms: *timestamp_ms,
                level: *level,
                component: component.clone(),
                phase_id: phase_id.clone(),
                message: message.clone(),
            });
            state.log_sequences.insert(id.clone(), *sequence);
        }
    }
}

/// Marks a task terminal: sets status-independent bookkeeping fields
/// common to every terminal transition, then clears the active-task
/// pointer if it pointed at this task.
fn finalize(
    state: &mut TaskState,
    id: &spindle_core::TaskId,
    completed_at_ms: u64,
    set_status: impl FnOnce(&mut Task),
) {
    if let Some(task) = state.tasks.get_mut(id) {
        if task.is_terminal() {
            return;
        }
        set_status(task);
        task.completed_at_ms = Some(completed_at_ms);
        task.duration_ms = task.started_at_ms.map(|started| completed_at_ms.saturating_sub(started));
        task.updated_at_ms = completed_at_ms;
        task.is_active = false;
    }
    if state.active_task_id.as_ref() == Some(id) {
        state.active_task_id = None;
    }
}

fn compute_progress(task: &Task) -> u8 {
    let total: u64 = task.phase_states.values().map(|p| p.items_total).sum();
    if total == 0 {
        return task.progress_percent;
    }
    let done: u64 = task.phase_states.values().map(|p| p.items_done()).sum();
    ((done * 100) / total).min(99) as u8
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
