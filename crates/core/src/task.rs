// SPDX-License-Identifier: MIT

//! Task identity and state machine.

use crate::ids::TaskId;
use crate::phase::PhaseState;
use crate::preferences::Preferences;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a task was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    FullPipeline,
    FetchOnly,
    SynthesisOnly,
    EmbeddingOnly,
    GitOnly,
    Custom,
}

crate::simple_display! {
    TaskKind {
        FullPipeline => "full_pipeline",
        FetchOnly => "fetch_only",
        SynthesisOnly => "synthesis_only",
        EmbeddingOnly => "embedding_only",
        GitOnly => "git_only",
        Custom => "custom",
    }
}

/// Lifecycle status of a task. See spec.md §3.1 for the terminal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
    Revoked,
}

impl TaskStatus {
    /// Terminal statuses accept no further phase events (spec.md §3.1 invariant).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled | Self::Revoked)
    }

    pub fn is_active_eligible(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
        Revoked => "revoked",
    }
}

/// Wire-level error taxonomy (spec.md §7). Never a Rust error type name —
/// this is the tag a terminal, non-success task exposes to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    TransientHandler,
    FatalHandler,
    WorkerLost,
    Stuck,
    Timeout,
    Cancelled,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        Conflict => "conflict",
        TransientHandler => "transient_handler",
        FatalHandler => "fatal_handler",
        WorkerLost => "worker_lost",
        Stuck => "stuck",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

/// A single execution of the pipeline (spec.md §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Delivery/lease identifier assigned by the message bus once enqueued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_task_id: Option<String>,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub preferences: Preferences,
    pub phase_states: BTreeMap<String, PhaseState>,
    pub progress_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_trace: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_archived: bool,
    /// Durable cancellation flag set by `stop_task`, observed by the worker.
    #[serde(default)]
    pub cancel_requested: bool,
    pub created_at_ms: u64,
}

impl Task {
    pub fn new(id: TaskId, kind: TaskKind, preferences: Preferences, now_ms: u64) -> Self {
        Self {
            id,
            worker_task_id: None,
            kind,
            status: TaskStatus::Pending,
            preferences,
            phase_states: BTreeMap::new(),
            progress_percent: 0,
            current_phase_id: None,
            current_phase_message: None,
            started_at_ms: None,
            updated_at_ms: now_ms,
            completed_at_ms: None,
            duration_ms: None,
            result_summary: None,
            error_kind: None,
            error_message: None,
            error_trace: None,
            is_active: true,
            is_archived: false,
            cancel_requested: false,
            created_at_ms: now_ms,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
