// SPDX-License-Identifier: MIT

//! Materialized state built by replaying the WAL.

mod items;
mod tasks;

use serde::{Deserialize, Serialize};
use spindle_core::{Item, ItemEvent, ItemId, LogEntry, Task, TaskEvent, TaskId};
use std::collections::BTreeMap;

/// In-memory projection of every durably recorded task, maintained by
/// replaying [`TaskEvent`]s in sequence order. Never constructed any other
/// way — there is no path that mutates a `Task` without going through here.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TaskState {
    pub tasks: BTreeMap<TaskId, Task>,
    pub logs: BTreeMap<TaskId, Vec<LogEntry>>,
    pub log_sequences: BTreeMap<TaskId, u64>,
    /// The id of the single task for which `is_active && !is_terminal()`
    /// holds, if any — the process-wide invariant from spec.md §3.1.
    pub active_task_id: Option<TaskId>,
}

impl TaskState {
    pub fn apply(&mut self, event: &TaskEvent) {
        tasks::apply(self, event);
    }
}

/// In-memory projection of every ingested item, maintained by replaying
/// [`ItemEvent`]s.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ItemState {
    pub items: BTreeMap<ItemId, Item>,
}

impl ItemState {
    pub fn apply(&mut self, event: &ItemEvent) {
        items::apply(self, event);
    }
}
