// SPDX-License-Identifier: MIT

//! C2: Task Store — durable task records, enqueue/start/progress/terminal
//! transitions, and the append-only task log.

use crate::errors::StorageError;
use crate::snapshot;
use crate::state::TaskState;
use crate::wal::Wal;
use parking_lot::Mutex;
use spindle_core::task::{ErrorKind, TaskKind};
use spindle_core::{Clock, LogEntry, LogLevel, Preferences, Task, TaskEvent, TaskId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Inner {
    wal: Wal<TaskEvent>,
    state: TaskState,
    snapshot_path: PathBuf,
}

/// The single authority on task status (spec.md §7 propagation policy).
/// Every mutation is appended to the WAL, applied to in-memory state, then
/// flushed — in that order — so a crash leaves nothing half-written.
pub struct TaskStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl TaskStore {
    pub fn open(dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        let snapshot_path = dir.join("tasks.snapshot.json");
        let mut state = TaskState::default();
        let mut processed_seq = 0;
        if let Some(snap) = snapshot::load::<TaskState>(&snapshot_path)? {
            state = snap.state;
            processed_seq = snap.seq;
        }

        let mut wal: Wal<TaskEvent> = Wal::open(dir.join("tasks.wal"), processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self { inner: Mutex::new(Inner { wal, state, snapshot_path }), clock })
    }

    fn commit(&self, inner: &mut Inner, event: TaskEvent) -> Result<(), StorageError> {
        inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply(&event);
        Ok(())
    }

    /// Create a new task and make it the active task. Enforces the
    /// at-most-once active-task invariant (spec.md §5): if another task is
    /// already active, the loser gets [`StorageError::TaskAlreadyActive`].
    pub fn create_task(&self, kind: TaskKind, preferences: Preferences) -> Result<TaskId, StorageError> {
        let mut inner = self.inner.lock();
        if let Some(active) = inner.state.active_task_id.clone() {
            return Err(StorageError::TaskAlreadyActive(active));
        }
        let id = TaskId::new();
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskCreated { id: id.clone(), kind, preferences, created_at_ms: now })?;
        Ok(id)
    }

    pub fn mark_enqueued(&self, id: &TaskId, delivery_id: spindle_core::DeliveryId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        self.commit(&mut inner, TaskEvent::TaskEnqueued { id: id.clone(), delivery_id })
    }

    pub fn start_task(&self, id: &TaskId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskStarted { id: id.clone(), started_at_ms: now })
    }

    pub fn phase_started(&self, id: &TaskId, stage: spindle_core::StageId, items_total: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::PhaseStarted { id: id.clone(), stage, items_total, started_at_ms: now })
    }

    pub fn phase_progressed(
        &self,
        id: &TaskId,
        stage: spindle_core::StageId,
        succeeded_delta: u64,
        failed_delta: u64,
        skipped_delta: u64,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_active(&inner.state, id)?;
        self.commit(&mut inner, TaskEvent::PhaseProgressed { id: id.clone(), stage, succeeded_delta, failed_delta, skipped_delta })
    }

    pub fn phase_completed(&self, id: &TaskId, stage: spindle_core::StageId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_active(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::PhaseCompleted { id: id.clone(), stage, finished_at_ms: now })
    }

    pub fn phase_skipped(&self, id: &TaskId, stage: spindle_core::StageId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_active(&inner.state, id)?;
        self.commit(&mut inner, TaskEvent::PhaseSkipped { id: id.clone(), stage })
    }

    pub fn phase_failed(&self, id: &TaskId, stage: spindle_core::StageId, message: String) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_active(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::PhaseFailed { id: id.clone(), stage, finished_at_ms: now, message })
    }

    pub fn succeed_task(&self, id: &TaskId, result_summary: Option<String>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskSucceeded { id: id.clone(), completed_at_ms: now, result_summary })
    }

    pub fn fail_task(&self, id: &TaskId, error_kind: ErrorKind, error_message: String, error_trace: Option<String>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskFailed { id: id.clone(), completed_at_ms: now, error_kind, error_message, error_trace })
    }

    /// Sets the durable cancellation flag observed cooperatively by the
    /// worker (spec.md §5 cancellation semantics).
    pub fn request_cancel(&self, id: &TaskId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::CancelRequested { id: id.clone(), requested_at_ms: now })
    }

    pub fn cancel_task(&self, id: &TaskId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskCancelled { id: id.clone(), completed_at_ms: now })
    }

    pub fn revoke_task(&self, id: &TaskId, reason: String) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        let now = self.clock.epoch_ms();
        self.commit(&mut inner, TaskEvent::TaskRevoked { id: id.clone(), completed_at_ms: now, reason })
    }

    pub fn archive_task(&self, id: &TaskId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_task(&inner.state, id)?;
        self.commit(&mut inner, TaskEvent::TaskArchived { id: id.clone() })
    }

    /// Revokes every non-terminal task under a single lock acquisition, so
    /// no concurrent `create_task` can claim the active slot mid-reset.
    /// Returns the ids revoked. Used on daemon startup recovery.
    pub fn comprehensive_reset(&self, reason: String) -> Result<Vec<TaskId>, StorageError> {
        let mut inner = self.inner.lock();
        let ids: Vec<TaskId> = inner.state.tasks.values().filter(|t| !t.status.is_terminal()).map(|t| t.id.clone()).collect();
        let now = self.clock.epoch_ms();
        for id in &ids {
            self.commit(&mut inner, TaskEvent::TaskRevoked { id: id.clone(), completed_at_ms: now, reason: reason.clone() })?;
        }
        Ok(ids)
    }

    /// Appends a dense, gap-free log line for `id` (spec.md §3.1 LogEntry
    /// invariant) — the sequence number is assigned here, never by callers.
    pub fn append_log(&self, id: &TaskId, level: LogLevel, component: impl Into<String>, phase_id: Option<String>, message: impl Into<String>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        self.require_active(&inner.state, id)?;
        let sequence = inner.state.log_sequences.get(id).copied().unwrap_or(0) + 1;
        let now = self.clock.epoch_ms();
        self.commit(
            &mut inner,
            TaskEvent::LogAppended {
                id: id.clone(),
                sequence,
                timestamp_ms: now,
                level,
                component: component.into(),
                phase_id,
                message: message.into(),
            },
        )
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.lock().state.tasks.get(id).cloned()
    }

    pub fn get_active(&self) -> Option<Task> {
        let inner = self.inner.lock();
        inner.state.active_task_id.as_ref().and_then(|id| inner.state.tasks.get(id)).cloned()
    }

    pub fn list(&self) -> Vec<Task> {
        self.inner.lock().state.tasks.values().cloned().collect()
    }

    pub fn logs_since(&self, id: &TaskId, since_sequence: u64, limit: usize) -> Vec<LogEntry> {
        let inner = self.inner.lock();
        inner
            .state
            .logs
            .get(id)
            .map(|entries| entries.iter().filter(|e| e.sequence > since_sequence).take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshots the current materialized state at the WAL's write
    /// sequence, so the next restart can skip straight to replaying only
    /// what followed.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        let inner = self.inner.lock();
        let seq = inner.wal.write_seq();
        snapshot::save(&inner.snapshot_path, seq, &inner.state, self.clock.epoch_ms())?;
        Ok(())
    }

    fn require_task(&self, state: &TaskState, id: &TaskId) -> Result<(), StorageError> {
        if state.tasks.contains_key(id) {
            Ok(())
        } else {
            Err(StorageError::TaskNotFound(id.clone()))
        }
    }

    /// Like [`require_task`](Self::require_task), but also rejects a task
    /// that has already reached a terminal status (spec.md §4.2): once the
    /// Reaper fails a stuck task, a still-running Worker must not be able
    /// to keep mutating it via phase/log events.
    fn require_active(&self, state: &TaskState, id: &TaskId) -> Result<(), StorageError> {
        match state.tasks.get(id) {
            None => Err(StorageError::TaskNotFound(id.clone())),
            Some(task) if task.is_terminal() => Err(StorageError::TaskTerminal(id.clone())),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
