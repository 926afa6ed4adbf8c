// SPDX-License-Identifier: MIT

//! C1 (durable half): FIFO work queue with lease-based at-least-once
//! delivery, generalizing the teacher's `QueueItemStatus` state machine
//! into a queue-agnostic trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use spindle_core::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueItemStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Dead,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("delivery {0} not found or already acknowledged")]
    UnknownDelivery(String),
    #[error("delivery {0} lease does not belong to the current reservation")]
    LeaseExpired(String),
}

/// A durable work queue with exclusive, time-bounded leases. `enqueue`
/// returns once the payload is durably accepted; `reserve` hands out an
/// exclusive lease that must be `ack`'d or `nack`'d, or it is re-queued
/// once `visibility` elapses.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn enqueue(&self, queue: &str, payload: Vec<u8>) -> Result<String, BusError>;
    async fn reserve(&self, queue: &str, worker_id: &str, visibility_ms: u64) -> Result<Option<(String, Vec<u8>)>, BusError>;
    async fn ack(&self, delivery_id: &str) -> Result<(), BusError>;
    async fn nack(&self, delivery_id: &str, requeue: bool) -> Result<(), BusError>;
    /// Reap leases that expired without an ack/nack, making their items
    /// eligible for reservation again. Returns the delivery ids reaped.
    async fn reap_expired_leases(&self, now_ms: u64) -> Vec<String>;
}

struct Item {
    queue: String,
    payload: Vec<u8>,
    status: QueueItemStatus,
    lease_worker: Option<String>,
    lease_expires_ms: Option<u64>,
    failure_count: u32,
}

struct Inner {
    queues: HashMap<String, VecDeque<String>>,
    items: HashMap<String, Item>,
}

/// In-process `MessageBus`, the shipped default (spec.md §4.1 Message Bus
/// contract minus cross-process persistence). An external Redis-backed
/// implementation is a drop-in replacement for multi-process deployments.
pub struct InMemoryBus {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

const MAX_DELIVERY_ATTEMPTS: u32 = 5;

impl InMemoryBus {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { inner: Mutex::new(Inner { queues: HashMap::new(), items: HashMap::new() }), clock }
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn enqueue(&self, queue: &str, payload: Vec<u8>) -> Result<String, BusError> {
        let delivery_id = format!("dly-{}", nanoid::nanoid!(12));
        let mut inner = self.inner.lock();
        inner.items.insert(
            delivery_id.clone(),
            Item { queue: queue.to_string(), payload, status: QueueItemStatus::Pending, lease_worker: None, lease_expires_ms: None, failure_count: 0 },
        );
        inner.queues.entry(queue.to_string()).or_default().push_back(delivery_id.clone());
        Ok(delivery_id)
    }

    async fn reserve(&self, queue: &str, worker_id: &str, visibility_ms: u64) -> Result<Option<(String, Vec<u8>)>, BusError> {
        let mut inner = self.inner.lock();
        let now = self.clock.epoch_ms();
        let Some(pending) = inner.queues.get_mut(queue) else { return Ok(None) };
        while let Some(delivery_id) = pending.pop_front() {
            let Some(item) = inner.items.get_mut(&delivery_id) else { continue };
            if item.status != QueueItemStatus::Pending {
                continue;
            }
            item.status = QueueItemStatus::Active;
            item.lease_worker = Some(worker_id.to_string());
            item.lease_expires_ms = Some(now + visibility_ms);
            return Ok(Some((delivery_id, item.payload.clone())));
        }
        Ok(None)
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        let item = inner.items.get_mut(delivery_id).ok_or_else(|| BusError::UnknownDelivery(delivery_id.to_string()))?;
        item.status = QueueItemStatus::Completed;
        item.lease_worker = None;
        item.lease_expires_ms = None;
        Ok(())
    }

    async fn nack(&self, delivery_id: &str, requeue: bool) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        let queue_name;
        {
            let item = inner.items.get_mut(delivery_id).ok_or_else(|| BusError::UnknownDelivery(delivery_id.to_string()))?;
            item.failure_count += 1;
            item.lease_worker = None;
            item.lease_expires_ms = None;
            queue_name = item.queue.clone();
            if requeue && item.failure_count < MAX_DELIVERY_ATTEMPTS {
                item.status = QueueItemStatus::Pending;
            } else {
                item.status = if requeue { QueueItemStatus::Dead } else { QueueItemStatus::Failed };
            }
        }
        if inner.items.get(delivery_id).map(|i| i.status) == Some(QueueItemStatus::Pending) {
            inner.queues.entry(queue_name).or_default().push_back(delivery_id.to_string());
        }
        Ok(())
    }

    async fn reap_expired_leases(&self, now_ms: u64) -> Vec<String> {
        let mut inner = self.inner.lock();
        let mut reaped = Vec::new();
        let expired_ids: Vec<String> = inner
            .items
            .iter()
            .filter(|(_, item)| item.status == QueueItemStatus::Active && item.lease_expires_ms.is_some_and(|exp| exp <= now_ms))
            .map(|(id, _)| id.clone())
            .collect();

        for delivery_id in expired_ids {
            let queue_name = {
                let item = inner.items.get_mut(&delivery_id).expect("scanned above");
                item.status = QueueItemStatus::Pending;
                item.lease_worker = None;
                item.lease_expires_ms = None;
                item.queue.clone()
            };
            inner.queues.entry(queue_name).or_default().push_back(delivery_id.clone());
            reaped.push(delivery_id);
        }
        reaped
    }
}

#[cfg(test)]
#[path = "message_bus_tests.rs"]
mod tests;
