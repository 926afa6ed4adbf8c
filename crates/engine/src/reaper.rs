// SPDX-License-Identifier: MIT

//! C10: Monitor / Reaper — periodic stuck-task detection, lease reaping,
//! and the startup recovery path. Grounded on the teacher's
//! `UsageMetricsCollector::spawn_collector` interval-loop idiom.

use crate::error::EngineError;
use spindle_bus::{MessageBus, ProgressBus, ProgressEvent};
use spindle_core::task::ErrorKind;
use spindle_core::Clock;
use spindle_storage::TaskStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct Reaper {
    tasks: Arc<TaskStore>,
    bus: Arc<dyn MessageBus>,
    progress: Arc<ProgressBus>,
    clock: Arc<dyn Clock>,
    stuck_threshold: Duration,
}

impl Reaper {
    pub fn new(tasks: Arc<TaskStore>, bus: Arc<dyn MessageBus>, progress: Arc<ProgressBus>, clock: Arc<dyn Clock>, stuck_threshold: Duration) -> Self {
        Self { tasks, bus, progress, clock, stuck_threshold }
    }

    /// Spawns the periodic sweep at the given period (spec.md §4.10: half
    /// of `task.stuck_threshold` by default). Runs until the handle is
    /// aborted or dropped.
    pub fn spawn(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.sweep_once().await;
            }
        })
    }

    /// One sweep: reap expired C1 leases, then fail any task that hasn't
    /// reported progress within `stuck_threshold`.
    pub async fn sweep_once(&self) {
        let now_ms = self.clock.epoch_ms();
        let reaped = self.bus.reap_expired_leases(now_ms).await;
        for delivery_id in &reaped {
            tracing::warn!(delivery_id = %delivery_id, "reaped expired worker lease");
        }
        if let Err(e) = self.fail_stuck_tasks(now_ms) {
            tracing::error!(error = %e, "failed to mark stuck tasks");
        }
    }

    fn fail_stuck_tasks(&self, now_ms: u64) -> Result<(), EngineError> {
        let threshold_ms = self.stuck_threshold.as_millis() as u64;
        for task in self.tasks.list() {
            if task.status.is_terminal() {
                continue;
            }
            if now_ms.saturating_sub(task.updated_at_ms) < threshold_ms {
                continue;
            }
            tracing::warn!(task_id = %task.id, "task stuck, no progress within stuck_threshold");
            self.tasks.fail_task(&task.id, ErrorKind::Stuck, "no progress observed within stuck_threshold".to_string(), None)?;
            let sequence = Arc::new(AtomicU64::new(0));
            self.progress.publish(
                task.id.as_str(),
                ProgressEvent::TaskError { sequence: next(&sequence), error_kind: ErrorKind::Stuck, error_message: "no progress observed within stuck_threshold".to_string() },
            );
            if let Some(finished) = self.tasks.get(&task.id) {
                let duration_seconds = finished.duration_ms.unwrap_or(0) / 1000;
                self.progress.publish(
                    task.id.as_str(),
                    ProgressEvent::TaskCompleted { sequence: next(&sequence), status: finished.status.to_string(), result_summary: None, duration_seconds },
                );
            }
        }
        Ok(())
    }

    /// Startup recovery (spec.md §9): revoke every non-terminal task left
    /// over from a previous process, force-reap every outstanding C1
    /// lease, and clear every task's C3 replay ring so subscribers don't
    /// see events from a task that no longer runs.
    pub async fn comprehensive_reset(&self) -> Result<Vec<spindle_core::TaskId>, EngineError> {
        let reset = self.tasks.comprehensive_reset("comprehensive reset on daemon startup".to_string())?;
        self.bus.reap_expired_leases(u64::MAX).await;
        for task_id in &reset {
            self.progress.clear(task_id.as_str());
        }
        Ok(reset)
    }

    /// Archives every terminal task whose completion is older than
    /// `retention` (spec.md §4.2 `archive_tasks_older_than`).
    pub fn archive_old_tasks(&self, retention: Duration) -> Result<usize, EngineError> {
        let now_ms = self.clock.epoch_ms();
        let retention_ms = retention.as_millis() as u64;
        let mut archived = 0;
        for task in self.tasks.list() {
            if task.is_archived || !task.status.is_terminal() {
                continue;
            }
            let Some(completed_at_ms) = task.completed_at_ms else { continue };
            if now_ms.saturating_sub(completed_at_ms) >= retention_ms {
                self.tasks.archive_task(&task.id)?;
                archived += 1;
            }
        }
        Ok(archived)
    }
}

fn next(sequence: &Arc<AtomicU64>) -> u64 {
    sequence.fetch_add(1, Ordering::SeqCst)
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
