// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use spindle_bus::ProgressEvent;
use spindle_core::{LogEntry, Task, TaskId, TaskKind, TaskStatus};

/// Lightweight row for `ListTasks` — full `phase_states` are left off, the
/// way the teacher's `JobSummary` omits what only `JobDetail` needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSummary {
    pub id: TaskId,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress_percent: u8,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            kind: task.kind,
            status: task.status,
            progress_percent: task.progress_percent,
            created_at_ms: task.created_at_ms,
            updated_at_ms: task.updated_at_ms,
        }
    }
}

/// Full task record, for `GetTask`/`GetActiveTask`.
pub type TaskDetail = Task;

/// A page of durable log lines, with the cursor to resume from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub next_cursor: Option<u64>,
}

/// Response from the daemon to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success, for requests with no payload to return.
    Ok,

    /// Health check response.
    Pong,

    /// Version handshake response.
    Hello { version: String },

    /// Daemon is shutting down; no further requests will be served.
    ShuttingDown,

    /// `Status` result.
    Status { uptime_secs: u64, task_active: bool },

    /// `StartTask` succeeded.
    TaskStarted { task_id: TaskId },

    /// `CancelTask` was accepted (cancellation requested, not yet observed
    /// by the worker — spec.md §4.7).
    TaskCancelAccepted { accepted: bool },

    /// `GetActiveTask`/`GetTask` result.
    Task { task: Option<Box<TaskDetail>> },

    /// `GetTaskLogs` result.
    TaskLogs(LogPage),

    /// `GetTaskEvents` result: recent events from the C3 replay ring.
    TaskEvents { events: Vec<ProgressEvent> },

    /// One streamed event for a `Subscribe` connection. The stream ends
    /// when the task reaches a terminal state or the client disconnects.
    Event { event: ProgressEvent },

    /// `ListTasks` result.
    Tasks { tasks: Vec<TaskSummary>, total: usize },

    /// `AdminReset` result: ids of the tasks that were revoked.
    ResetDone { reset_task_ids: Vec<TaskId> },

    /// `AdminArchive` result: number of tasks archived.
    ArchiveDone { archived: usize },

    /// Generic error.
    Error { message: String },

    /// A start request arrived while another task was already active
    /// (spec.md S4).
    TaskAlreadyActive { active_task_id: TaskId },

    /// `StartTask`'s preferences failed validation.
    ContradictoryDirectives { message: String },

    /// The requested task has already reached a terminal state.
    TaskTerminal { task_id: TaskId },

    /// The requested task does not exist.
    NotFound { task_id: TaskId },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
