// SPDX-License-Identifier: MIT

//! C3: Progress Bus — typed pub/sub with a bounded per-task replay ring,
//! grounded on the teacher's durably-recorded-then-published `Effect::Emit`
//! discipline: callers are expected to have already committed the
//! corresponding change to the Task Store before publishing here.

use parking_lot::Mutex;
use spindle_core::task::ErrorKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A typed progress event (spec.md §4.3). Every variant carries `task_id`
/// at the call site via the channel key, not the payload, to keep the
/// wire shape flat.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    TaskStatus {
        sequence: u64,
        is_running: bool,
        current_phase_id: Option<String>,
        current_phase_message: Option<String>,
        started_at_ms: Option<u64>,
        updated_at_ms: u64,
    },
    PhaseUpdate {
        sequence: u64,
        phase_id: String,
        status: String,
        message: Option<String>,
        processed_count: u64,
        total_count: u64,
        error_count: u64,
        eta_seconds: Option<u64>,
    },
    PhaseComplete {
        sequence: u64,
        phase_id: String,
        processed_count: u64,
        total_count: u64,
        error_count: u64,
        duration_seconds: u64,
    },
    Log {
        sequence: u64,
        level: String,
        component: String,
        phase_id: Option<String>,
        message: String,
    },
    TaskCompleted {
        sequence: u64,
        status: String,
        result_summary: Option<String>,
        duration_seconds: u64,
    },
    TaskError {
        sequence: u64,
        error_kind: ErrorKind,
        error_message: String,
    },
}

const RING_CAPACITY: usize = 256;
const BROADCAST_CAPACITY: usize = 256;

struct TaskChannel {
    sender: broadcast::Sender<ProgressEvent>,
    ring: Vec<ProgressEvent>,
}

/// In-process pub/sub scoped by `task_id`, with replay of the last *N*
/// events for late joiners (spec.md §4.3, §4.9). Pub/sub delivery is
/// best-effort: it need not survive a restart, only the Task Store must.
pub struct ProgressBus {
    channels: Mutex<HashMap<String, TaskChannel>>,
    ring_capacity: usize,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(RING_CAPACITY)
    }
}

impl ProgressBus {
    pub fn new(ring_capacity: usize) -> Self {
        Self { channels: Mutex::new(HashMap::new()), ring_capacity }
    }

    /// Publish an event for `task_id`. Best-effort: if there are no
    /// subscribers the event is dropped from the live broadcast but still
    /// lands in the replay ring.
    pub fn publish(&self, task_id: &str, event: ProgressEvent) {
        let mut channels = self.channels.lock();
        let channel = channels.entry(task_id.to_string()).or_insert_with(|| TaskChannel {
            sender: broadcast::channel(BROADCAST_CAPACITY).0,
            ring: Vec::new(),
        });
        channel.ring.push(event.clone());
        if channel.ring.len() > self.ring_capacity {
            let overflow = channel.ring.len() - self.ring_capacity;
            channel.ring.drain(0..overflow);
        }
        let _ = channel.sender.send(event);
    }

    /// Subscribe to live events for `task_id`, plus up to `replay_last_n`
    /// buffered events from the ring to bridge a reconnect gap.
    pub fn subscribe(&self, task_id: &str, replay_last_n: usize) -> (Vec<ProgressEvent>, broadcast::Receiver<ProgressEvent>) {
        let mut channels = self.channels.lock();
        let channel = channels.entry(task_id.to_string()).or_insert_with(|| TaskChannel {
            sender: broadcast::channel(BROADCAST_CAPACITY).0,
            ring: Vec::new(),
        });
        let start = channel.ring.len().saturating_sub(replay_last_n);
        let replay = channel.ring[start..].to_vec();
        (replay, channel.sender.subscribe())
    }

    /// Drops a task's buffered ring and subscriber handle, e.g. once a
    /// task is archived (spec.md §4.10 `comprehensive_reset`).
    pub fn clear(&self, task_id: &str) {
        self.channels.lock().remove(task_id);
    }
}

pub type SharedProgressBus = Arc<ProgressBus>;

#[cfg(test)]
#[path = "progress_bus_tests.rs"]
mod tests;
