// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use spindle_core::{Preferences, TaskId, TaskKind};

/// Request from `spindle-cli` (or any other client) to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Version handshake, required as the first message on a TCP
    /// connection (Unix connections are implicitly trusted).
    Hello {
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },

    /// Liveness check.
    Ping,

    /// Request daemon shutdown.
    Shutdown {
        /// Revoke the in-flight task (if any) instead of leaving it for
        /// the next process to pick up via startup recovery.
        #[serde(default)]
        cancel_active: bool,
    },

    /// Daemon process status (uptime, whether a task is active).
    Status,

    /// `POST /tasks` equivalent (spec.md §6.1).
    StartTask { kind: TaskKind, preferences: Preferences },

    /// `POST /tasks/{task_id}/cancel` equivalent.
    CancelTask { task_id: TaskId },

    /// `GET /tasks/active` equivalent.
    GetActiveTask,

    /// `GET /tasks/{task_id}` equivalent.
    GetTask { task_id: TaskId },

    /// `GET /tasks/{task_id}/logs` equivalent.
    GetTaskLogs {
        task_id: TaskId,
        #[serde(default)]
        since_sequence: u64,
        #[serde(default)]
        limit: usize,
    },

    /// `GET /tasks/{task_id}/events` equivalent: drains the C3 replay
    /// ring, optionally filtered by event kind tag.
    GetTaskEvents {
        task_id: TaskId,
        #[serde(default)]
        kinds: Option<Vec<String>>,
        #[serde(default)]
        limit: usize,
    },

    /// Upgrades this connection into a streaming feed of `Event` frames
    /// for `task_id` until it terminates or the client disconnects
    /// (spec.md §6.2).
    Subscribe { task_id: TaskId },

    /// `GET /tasks?status=...&kind=...&limit=...&offset=...` equivalent.
    ListTasks {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        kind: Option<String>,
        #[serde(default)]
        limit: usize,
        #[serde(default)]
        offset: usize,
    },

    /// `POST /admin/reset` equivalent.
    AdminReset,

    /// `POST /admin/archive?older_than=...` equivalent. `older_than`
    /// takes the same duration grammar as `spindle-core::config`
    /// (`"30d"`, `"12h"`, ...); `None` uses the configured default.
    AdminArchive { older_than: Option<String> },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
