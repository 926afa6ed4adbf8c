// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use spindle_core::TaskId;

/// Opaque payload enqueued on the message bus (spec.md §4.1). Carries just
/// enough to let a worker look the rest of the task up from the Task
/// Store — the queue is a dispatch hint, not a second source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: TaskId,
}
