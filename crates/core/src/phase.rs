// SPDX-License-Identifier: MIT

//! Per-phase progress tracking within a [`Task`](crate::task::Task).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Running,
    Success,
    Skipped,
    Failed,
}

crate::simple_display! {
    PhaseStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Skipped => "skipped",
        Failed => "failed",
    }
}

/// Progress of a single pipeline stage within one task (spec.md §3.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    pub status: PhaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    pub items_total: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub items_skipped: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PhaseState {
    pub fn pending() -> Self {
        Self {
            status: PhaseStatus::Pending,
            started_at_ms: None,
            finished_at_ms: None,
            items_total: 0,
            items_succeeded: 0,
            items_failed: 0,
            items_skipped: 0,
            message: None,
        }
    }

    pub fn items_done(&self) -> u64 {
        self.items_succeeded + self.items_failed + self.items_skipped
    }

    pub fn is_complete(&self) -> bool {
        self.items_total > 0 && self.items_done() >= self.items_total
    }
}
