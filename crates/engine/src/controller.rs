// SPDX-License-Identifier: MIT

//! C7: Task Controller — the sole ingress for task lifecycle mutations.

use crate::envelope::TaskEnvelope;
use crate::error::EngineError;
use spindle_bus::{MessageBus, ProgressBus, ProgressEvent};
use spindle_core::task::TaskKind;
use spindle_core::{DeliveryId, Preferences, TaskId};
use spindle_storage::TaskStore;
use std::sync::Arc;

/// Validates preferences, creates the task record, enqueues it on C1, and
/// publishes its initial status on C3. `stop_task` only ever sets the
/// durable cancellation flag — the Worker performs the actual transition
/// to `CANCELLED` once it observes it (spec.md §4.7).
pub struct Controller {
    tasks: Arc<TaskStore>,
    bus: Arc<dyn MessageBus>,
    progress: Arc<ProgressBus>,
    queue_name: String,
}

impl Controller {
    pub fn new(tasks: Arc<TaskStore>, bus: Arc<dyn MessageBus>, progress: Arc<ProgressBus>, queue_name: impl Into<String>) -> Self {
        Self { tasks, bus, progress, queue_name: queue_name.into() }
    }

    pub async fn start_task(&self, kind: TaskKind, preferences: Preferences) -> Result<TaskId, EngineError> {
        preferences.clone().into_directives()?;

        let task_id = self.tasks.create_task(kind, preferences)?;

        let payload = serde_json::to_vec(&TaskEnvelope { task_id: task_id.clone() })?;
        let delivery_id = self.bus.enqueue(&self.queue_name, payload).await?;
        self.tasks.mark_enqueued(&task_id, DeliveryId::from_string(&delivery_id))?;

        if let Some(task) = self.tasks.get(&task_id) {
            self.progress.publish(
                task_id.as_str(),
                ProgressEvent::TaskStatus {
                    sequence: 0,
                    is_running: false,
                    current_phase_id: task.current_phase_id.clone(),
                    current_phase_message: task.current_phase_message.clone(),
                    started_at_ms: task.started_at_ms,
                    updated_at_ms: task.updated_at_ms,
                },
            );
        }

        tracing::info!(task_id = %task_id, delivery_id = %delivery_id, "task enqueued");
        Ok(task_id)
    }

    pub async fn stop_task(&self, task_id: &TaskId) -> Result<(), EngineError> {
        let task = self.tasks.get(task_id).ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))?;
        if task.is_terminal() {
            return Err(EngineError::TaskTerminal(task_id.clone()));
        }
        self.tasks.request_cancel(task_id)?;
        tracing::info!(task_id = %task_id, "cancellation requested");
        Ok(())
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
