// SPDX-License-Identifier: MIT

//! Event-sourcing vocabulary. Every durable state transition in the Task
//! Store and Item Repository is expressed as one of these variants, appended
//! to the write-ahead log before it is applied to in-memory state.

use crate::ids::{DeliveryId, ItemId, StageId, TaskId};
use crate::item::ItemDerived;
use crate::log_entry::LogLevel;
use crate::preferences::Preferences;
use crate::task::{ErrorKind, TaskKind};
use serde::{Deserialize, Serialize};

/// Mutations replayed against [`MaterializedState`](crate) for the Task Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    TaskCreated {
        id: TaskId,
        kind: TaskKind,
        preferences: Preferences,
        created_at_ms: u64,
    },
    TaskEnqueued {
        id: TaskId,
        delivery_id: DeliveryId,
    },
    TaskStarted {
        id: TaskId,
        started_at_ms: u64,
    },
    PhaseStarted {
        id: TaskId,
        stage: StageId,
        items_total: u64,
        started_at_ms: u64,
    },
    PhaseProgressed {
        id: TaskId,
        stage: StageId,
        succeeded_delta: u64,
        failed_delta: u64,
        skipped_delta: u64,
    },
    PhaseCompleted {
        id: TaskId,
        stage: StageId,
        finished_at_ms: u64,
    },
    PhaseSkipped {
        id: TaskId,
        stage: StageId,
    },
    PhaseFailed {
        id: TaskId,
        stage: StageId,
        finished_at_ms: u64,
        message: String,
    },
    ProgressUpdated {
        id: TaskId,
        percent: u8,
        phase_id: Option<String>,
        message: Option<String>,
    },
    TaskSucceeded {
        id: TaskId,
        completed_at_ms: u64,
        result_summary: Option<String>,
    },
    TaskFailed {
        id: TaskId,
        completed_at_ms: u64,
        error_kind: ErrorKind,
        error_message: String,
        error_trace: Option<String>,
    },
    CancelRequested {
        id: TaskId,
        requested_at_ms: u64,
    },
    TaskCancelled {
        id: TaskId,
        completed_at_ms: u64,
    },
    TaskRevoked {
        id: TaskId,
        completed_at_ms: u64,
        reason: String,
    },
    TaskArchived {
        id: TaskId,
    },
    LogAppended {
        id: TaskId,
        sequence: u64,
        timestamp_ms: u64,
        level: LogLevel,
        component: String,
        phase_id: Option<String>,
        message: String,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::TaskCreated { id, .. }
            | Self::TaskEnqueued { id, .. }
            | Self::TaskStarted { id, .. }
            | Self::PhaseStarted { id, .. }
            | Self::PhaseProgressed { id, .. }
            | Self::PhaseCompleted { id, .. }
            | Self::PhaseSkipped { id, .. }
            | Self::PhaseFailed { id, .. }
            | Self::ProgressUpdated { id, .. }
            | Self::TaskSucceeded { id, .. }
            | Self::TaskFailed { id, .. }
            | Self::CancelRequested { id, .. }
            | Self::TaskCancelled { id, .. }
            | Self::TaskRevoked { id, .. }
            | Self::TaskArchived { id }
            | Self::LogAppended { id, .. } => id,
        }
    }
}

/// Mutations replayed against the Item Repository's materialized state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemEvent {
    ItemIngested {
        item_id: ItemId,
        raw_payload: Vec<u8>,
    },
    ItemFlagSet {
        item_id: ItemId,
        stage: StageId,
        expected_version: u64,
    },
    ItemDerivedUpdated {
        item_id: ItemId,
        derived: ItemDerived,
        expected_version: u64,
    },
}

impl ItemEvent {
    pub fn item_id(&self) -> &ItemId {
        match self {
            Self::ItemIngested { item_id, .. }
            | Self::ItemFlagSet { item_id, .. }
            | Self::ItemDerivedUpdated { item_id, .. } => item_id,
        }
    }
}
