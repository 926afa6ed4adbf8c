// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::FakeClock;

fn bus() -> InMemoryBus {
    InMemoryBus::new(Arc::new(FakeClock::new(0)))
}

#[tokio::test]
async fn enqueue_then_reserve_delivers_payload() {
    let bus = bus();
    bus.enqueue("tasks", b"hello".to_vec()).await.unwrap();

    let (delivery_id, payload) = bus.reserve("tasks", "worker-1", 30_000).await.unwrap().unwrap();
    assert_eq!(payload, b"hello");
    bus.ack(&delivery_id).await.unwrap();
}

#[tokio::test]
async fn reserve_on_empty_queue_returns_none() {
    let bus = bus();
    assert!(bus.reserve("tasks", "worker-1", 30_000).await.unwrap().is_none());
}

#[tokio::test]
async fn second_reserve_does_not_see_an_active_lease() {
    let bus = bus();
    bus.enqueue("tasks", b"hello".to_vec()).await.unwrap();
    bus.reserve("tasks", "worker-1", 30_000).await.unwrap().unwrap();

    assert!(bus.reserve("tasks", "worker-2", 30_000).await.unwrap().is_none());
}

#[tokio::test]
async fn nack_with_requeue_makes_item_reservable_again() {
    let bus = bus();
    bus.enqueue("tasks", b"hello".to_vec()).await.unwrap();
    let (delivery_id, _) = bus.reserve("tasks", "worker-1", 30_000).await.unwrap().unwrap();

    bus.nack(&delivery_id, true).await.unwrap();
    assert!(bus.reserve("tasks", "worker-2", 30_000).await.unwrap().is_some());
}

#[tokio::test]
async fn nack_without_requeue_marks_item_failed() {
    let bus = bus();
    bus.enqueue("tasks", b"hello".to_vec()).await.unwrap();
    let (delivery_id, _) = bus.reserve("tasks", "worker-1", 30_000).await.unwrap().unwrap();

    bus.nack(&delivery_id, false).await.unwrap();
    assert!(bus.reserve("tasks", "worker-2", 30_000).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_lease_is_reaped_and_requeued() {
    let clock = Arc::new(FakeClock::new(0));
    let bus = InMemoryBus::new(clock.clone());
    bus.enqueue("tasks", b"hello".to_vec()).await.unwrap();
    bus.reserve("tasks", "worker-1", 1_000).await.unwrap().unwrap();

    clock.advance_ms(2_000);
    let reaped = bus.reap_expired_leases(clock.epoch_ms()).await;
    assert_eq!(reaped.len(), 1);

    assert!(bus.reserve("tasks", "worker-2", 30_000).await.unwrap().is_some());
}

#[tokio::test]
async fn ack_unknown_delivery_is_an_error() {
    let bus = bus();
    assert!(matches!(bus.ack("dly-does-not-exist").await, Err(BusError::UnknownDelivery(_))));
}
