// SPDX-License-Identifier: MIT

//! C8: Worker Runtime — executes one reserved task to completion,
//! grounded on the teacher's `Executor::execute` (durably apply, then
//! publish) and its `tracing`-wrapped timing/error idiom.

use crate::envelope::TaskEnvelope;
use crate::error::EngineError;
use spindle_bus::{MessageBus, ProgressBus, ProgressEvent};
use spindle_core::ids::stage;
use spindle_core::task::ErrorKind;
use spindle_core::{Directives, Item, ItemId, StageId, TaskId};
use spindle_handlers::{HandlerError, HandlerRegistry, StageContext};
use spindle_storage::{ItemRepository, TaskStore};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// How the stage loop ended, so the caller knows whether to ack or nack
/// the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
    Cancelled,
}

/// One worker process's view of C1/C2/C3/C4/C6, driving reserved tasks
/// through the lifecycle in spec.md §4.8. A worker holds at most one
/// active task at a time (spec.md §4.8 concurrency model); running
/// several concurrently means running several `Worker`s.
pub struct Worker {
    worker_id: String,
    queue_name: String,
    lease_ms: u64,
    tasks: Arc<TaskStore>,
    items: Arc<ItemRepository>,
    bus: Arc<dyn MessageBus>,
    progress: Arc<ProgressBus>,
    registry: Arc<HandlerRegistry>,
    handler_timeout: Duration,
    cancel_poll_interval: Duration,
    default_max_concurrent_items: u32,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: impl Into<String>,
        queue_name: impl Into<String>,
        lease_ms: u64,
        tasks: Arc<TaskStore>,
        items: Arc<ItemRepository>,
        bus: Arc<dyn MessageBus>,
        progress: Arc<ProgressBus>,
        registry: Arc<HandlerRegistry>,
        handler_timeout: Duration,
        default_max_concurrent_items: u32,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            queue_name: queue_name.into(),
            lease_ms,
            tasks,
            items,
            bus,
            progress,
            registry,
            handler_timeout,
            cancel_poll_interval: Duration::from_millis(200),
            default_max_concurrent_items,
        }
    }

    /// Reserve and run at most one task. Returns `false` if the queue was
    /// empty. A caller typically loops on this inside `tokio::spawn`.
    pub async fn run_once(&self) -> Result<bool, EngineError> {
        let Some((delivery_id, payload)) = self.bus.reserve(&self.queue_name, &self.worker_id, self.lease_ms).await? else {
            return Ok(false);
        };

        let envelope: TaskEnvelope = match serde_json::from_slice(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(%delivery_id, error = %e, "undecodable task envelope, dropping delivery");
                self.bus.ack(&delivery_id).await?;
                return Ok(true);
            }
        };

        let Some(task) = self.tasks.get(&envelope.task_id) else {
            tracing::warn!(task_id = %envelope.task_id, "reserved task vanished from the store, dropping delivery");
            self.bus.ack(&delivery_id).await?;
            return Ok(true);
        };

        if task.is_terminal() {
            tracing::info!(task_id = %envelope.task_id, "reserved task already terminal, acking stale delivery");
            self.bus.ack(&delivery_id).await?;
            return Ok(true);
        }

        match self.execute_task(&envelope.task_id).await {
            Ok(outcome) => {
                tracing::debug!(task_id = %envelope.task_id, ?outcome, "task run finished, acking delivery");
                self.bus.ack(&delivery_id).await?;
            }
            Err(e) => {
                tracing::error!(task_id = %envelope.task_id, error = %e, "worker I/O error, requeueing delivery");
                self.bus.nack(&delivery_id, true).await?;
                return Err(e);
            }
        }
        Ok(true)
    }

    async fn execute_task(&self, task_id: &TaskId) -> Result<Outcome, EngineError> {
        let task = self.tasks.get(task_id).ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))?;
        let directives = task.preferences.clone().into_directives()?;
        let max_concurrent_items = self.default_max_concurrent_items;
        let sequence = Arc::new(AtomicU64::new(1));
        let cancel = CancellationToken::new();

        self.tasks.start_task(task_id)?;
        self.publish_task_status(task_id, &sequence)?;

        let watcher = self.spawn_cancel_watcher(task_id.clone(), cancel.clone());

        let outcome = self
            .run_stages(task_id, &directives, &sequence, &cancel, max_concurrent_items)
            .await;

        watcher.abort();

        match outcome {
            Ok(()) => {
                self.finish_succeeded(task_id, &sequence)?;
                Ok(Outcome::Succeeded)
            }
            Err(StageLoopError::Cancelled) => {
                self.finish_cancelled(task_id, &sequence)?;
                Ok(Outcome::Cancelled)
            }
            Err(StageLoopError::Failed { kind, message }) => {
                self.finish_failed(task_id, &sequence, kind, message)?;
                Ok(Outcome::Failed)
            }
            Err(StageLoopError::Storage(e)) => Err(e.into()),
        }
    }

    /// Polls the durable cancellation flag and fires `cancel` once it is
    /// observed, bridging C2's durable flag into the in-process token
    /// handlers actually check (spec.md §5 cooperative cancellation).
    fn spawn_cancel_watcher(&self, task_id: TaskId, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let tasks = Arc::clone(&self.tasks);
        let interval = self.cancel_poll_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if cancel.is_cancelled() {
                    return;
                }
                match tasks.get(&task_id) {
                    Some(task) if task.cancel_requested => {
                        cancel.cancel();
                        return;
                    }
                    Some(task) if task.is_terminal() => return,
                    None => return,
                    _ => {}
                }
            }
        })
    }

    async fn run_stages(
        &self,
        task_id: &TaskId,
        directives: &Directives,
        sequence: &Arc<AtomicU64>,
        cancel: &CancellationToken,
        max_concurrent_items: u32,
    ) -> Result<(), StageLoopError> {
        // Re-plan before every stage rather than once up front: a stage's
        // own handler is what sets the flag the next stage's prerequisite
        // checks (spec.md §3.1 "recomputed at run start and optionally
        // between stages"). Planning once would leave every downstream
        // stage seeing the pre-run snapshot forever, so nothing past the
        // first stage would ever become eligible.
        for stage_id_str in stage::FULL_ORDER {
            let stage_id = StageId::new(*stage_id_str);

            if cancel.is_cancelled() {
                return Err(StageLoopError::Cancelled);
            }

            let items: BTreeMap<ItemId, Item> = self.items.all().into_iter().map(|item| (item.item_id.clone(), item)).collect();
            let plan = spindle_planner::plan(&items, directives);
            let Some(stage_plan) = plan.stage(&stage_id) else {
                return Err(StageLoopError::Failed {
                    kind: ErrorKind::FatalHandler,
                    message: format!("planner produced no entry for well-known stage '{stage_id}'"),
                });
            };

            if stage_plan.is_empty_of_work() {
                self.tasks.phase_skipped(task_id, stage_id.clone())?;
                self.publish_phase_update(task_id, sequence, &stage_id, "skipped", None, 0, 0, 0)?;
                self.publish_phase_complete(task_id, sequence, &stage_id, 0, 0, 0, 0)?;
                continue;
            }

            let Some(handler) = self.registry.get(&stage_id) else {
                return Err(StageLoopError::Failed {
                    kind: ErrorKind::FatalHandler,
                    message: format!("no handler registered for stage '{stage_id}'"),
                });
            };

            let item_ids: Vec<ItemId> = stage_plan.needs_processing.iter().cloned().collect();
            let total = item_ids.len() as u64;

            self.tasks.phase_started(task_id, stage_id.clone(), total)?;
            self.publish_phase_update(task_id, sequence, &stage_id, "active", None, 0, total, 0)?;

            let ctx = StageContext::new(task_id.clone(), directives.clone(), Arc::clone(&self.items), Arc::clone(&self.progress), cancel.clone(), max_concurrent_items);

            let stage_start = Instant::now();
            let outcome = tokio::time::timeout(self.handler_timeout, handler.execute(&ctx, &item_ids)).await;

            match outcome {
                Err(_elapsed) => {
                    return Err(StageLoopError::Failed {
                        kind: ErrorKind::Timeout,
                        message: format!("stage '{stage_id}' exceeded its {:?} handler timeout", self.handler_timeout),
                    });
                }
                Ok(Err(HandlerError::Cancelled)) => return Err(StageLoopError::Cancelled),
                Ok(Err(HandlerError::Timeout)) => {
                    return Err(StageLoopError::Failed { kind: ErrorKind::Timeout, message: format!("stage '{stage_id}' timed out") });
                }
                Ok(Err(HandlerError::Transient(message))) => {
                    return Err(StageLoopError::Failed { kind: ErrorKind::TransientHandler, message });
                }
                Ok(Err(HandlerError::Fatal(message))) => {
                    return Err(StageLoopError::Failed { kind: ErrorKind::FatalHandler, message });
                }
                Ok(Ok(result)) => {
                    self.apply_item_updates(&stage_id, &result)?;

                    if result.error_count > 0 && (result.error_count == result.total_count || directives.fail_fast) {
                        return Err(StageLoopError::Failed {
                            kind: ErrorKind::TransientHandler,
                            message: format!("stage '{stage_id}' had {} error(s) out of {} item(s)", result.error_count, result.total_count),
                        });
                    }

                    let succeeded = result.processed_count.saturating_sub(result.error_count);
                    self.tasks.phase_progressed(task_id, stage_id.clone(), succeeded, result.error_count, 0)?;
                    self.tasks.phase_completed(task_id, stage_id.clone())?;
                    let duration_seconds = stage_start.elapsed().as_secs();
                    self.publish_phase_update(
                        task_id,
                        sequence,
                        &stage_id,
                        "completed",
                        result.summary.clone(),
                        result.processed_count,
                        result.total_count,
                        result.error_count,
                    )?;
                    self.publish_phase_complete(task_id, sequence, &stage_id, result.processed_count, result.total_count, result.error_count, duration_seconds)?;
                }
            }

            if cancel.is_cancelled() {
                return Err(StageLoopError::Cancelled);
            }
        }

        Ok(())
    }

    /// Applies a stage's `item_updates` to C4. Each update may cost two
    /// writes (derived fields, then the completion flag) since they are
    /// separate events; `version` is threaded through by hand rather than
    /// re-read between the two, since nothing else writes this item while
    /// its owning task is the sole active task.
    fn apply_item_updates(&self, stage_id: &StageId, result: &spindle_handlers::StageResult) -> Result<(), spindle_storage::StorageError> {
        for (item_id, patch) in &result.item_updates {
            let Some(item) = self.items.get(item_id) else { continue };
            let mut version = item.version;
            if let Some(derived) = patch.derived.clone() {
                self.items.update_derived(item_id, derived, version)?;
                version += 1;
            }
            if patch.mark_done {
                self.items.set_flag(item_id, stage_id.clone(), version)?;
            }
        }
        Ok(())
    }

    fn next_sequence(sequence: &Arc<AtomicU64>) -> u64 {
        sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn publish_task_status(&self, task_id: &TaskId, sequence: &Arc<AtomicU64>) -> Result<(), spindle_storage::StorageError> {
        let task = self.tasks.get(task_id).ok_or_else(|| spindle_storage::StorageError::TaskNotFound(task_id.clone()))?;
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::TaskStatus {
                sequence: Self::next_sequence(sequence),
                is_running: task.status == spindle_core::TaskStatus::Running,
                current_phase_id: task.current_phase_id.clone(),
                current_phase_message: task.current_phase_message.clone(),
                started_at_ms: task.started_at_ms,
                updated_at_ms: task.updated_at_ms,
            },
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn publish_phase_update(
        &self,
        task_id: &TaskId,
        sequence: &Arc<AtomicU64>,
        stage_id: &StageId,
        status: &str,
        message: Option<String>,
        processed_count: u64,
        total_count: u64,
        error_count: u64,
    ) -> Result<(), spindle_storage::StorageError> {
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::PhaseUpdate {
                sequence: Self::next_sequence(sequence),
                phase_id: stage_id.as_str().to_string(),
                status: status.to_string(),
                message,
                processed_count,
                total_count,
                error_count,
                eta_seconds: None,
            },
        );
        Ok(())
    }

    fn publish_phase_complete(
        &self,
        task_id: &TaskId,
        sequence: &Arc<AtomicU64>,
        stage_id: &StageId,
        processed_count: u64,
        total_count: u64,
        error_count: u64,
        duration_seconds: u64,
    ) -> Result<(), spindle_storage::StorageError> {
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::PhaseComplete { sequence: Self::next_sequence(sequence), phase_id: stage_id.as_str().to_string(), processed_count, total_count, error_count, duration_seconds },
        );
        Ok(())
    }

    fn finish_succeeded(&self, task_id: &TaskId, sequence: &Arc<AtomicU64>) -> Result<(), spindle_storage::StorageError> {
        self.tasks.succeed_task(task_id, None)?;
        let task = self.tasks.get(task_id).ok_or_else(|| spindle_storage::StorageError::TaskNotFound(task_id.clone()))?;
        let duration_seconds = task.duration_ms.unwrap_or(0) / 1000;
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::TaskCompleted { sequence: Self::next_sequence(sequence), status: task.status.to_string(), result_summary: task.result_summary.clone(), duration_seconds },
        );
        tracing::info!(task_id = %task_id, "task succeeded");
        Ok(())
    }

    fn finish_cancelled(&self, task_id: &TaskId, sequence: &Arc<AtomicU64>) -> Result<(), spindle_storage::StorageError> {
        self.tasks.cancel_task(task_id)?;
        let task = self.tasks.get(task_id).ok_or_else(|| spindle_storage::StorageError::TaskNotFound(task_id.clone()))?;
        let duration_seconds = task.duration_ms.unwrap_or(0) / 1000;
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::TaskCompleted { sequence: Self::next_sequence(sequence), status: task.status.to_string(), result_summary: None, duration_seconds },
        );
        tracing::info!(task_id = %task_id, "task cancelled");
        Ok(())
    }

    fn finish_failed(&self, task_id: &TaskId, sequence: &Arc<AtomicU64>, kind: ErrorKind, message: String) -> Result<(), spindle_storage::StorageError> {
        self.tasks.fail_task(task_id, kind, message.clone(), None)?;
        self.progress.publish(task_id.as_str(), ProgressEvent::TaskError { sequence: Self::next_sequence(sequence), error_kind: kind, error_message: message });
        let task = self.tasks.get(task_id).ok_or_else(|| spindle_storage::StorageError::TaskNotFound(task_id.clone()))?;
        let duration_seconds = task.duration_ms.unwrap_or(0) / 1000;
        self.progress.publish(
            task_id.as_str(),
            ProgressEvent::TaskCompleted { sequence: Self::next_sequence(sequence), status: task.status.to_string(), result_summary: None, duration_seconds },
        );
        tracing::warn!(task_id = %task_id, error_kind = %kind, "task failed");
        Ok(())
    }
}

enum StageLoopError {
    Cancelled,
    Failed { kind: ErrorKind, message: String },
    Storage(spindle_storage::StorageError),
}

impl From<spindle_storage::StorageError> for StageLoopError {
    fn from(e: spindle_storage::StorageError) -> Self {
        Self::Storage(e)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
