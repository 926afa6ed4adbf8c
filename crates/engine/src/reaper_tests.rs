// SPDX-License-Identifier: MIT

use super::*;
use spindle_bus::InMemoryBus;
use spindle_core::task::{TaskKind, TaskStatus};
use spindle_core::{FakeClock, Preferences};
use tempfile::tempdir;

struct Harness {
    reaper: Reaper,
    tasks: Arc<TaskStore>,
    progress: Arc<ProgressBus>,
    clock: Arc<FakeClock>,
}

fn harness(stuck_threshold: Duration) -> Harness {
    let dir = tempdir().unwrap();
    let clock = Arc::new(FakeClock::new(1_000));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let tasks = Arc::new(TaskStore::open(dir.path(), Arc::clone(&dyn_clock)).unwrap());
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new(Arc::clone(&dyn_clock)));
    let progress = Arc::new(ProgressBus::default());
    let reaper = Reaper::new(Arc::clone(&tasks), bus, Arc::clone(&progress), dyn_clock, stuck_threshold);
    Harness { reaper, tasks, progress, clock }
}

#[tokio::test]
async fn sweep_leaves_a_fresh_task_alone() {
    let h = harness(Duration::from_secs(60));
    let task_id = h.tasks.create_task(TaskKind::FullPipeline, Preferences::default()).unwrap();
    h.tasks.start_task(&task_id).unwrap();

    h.reaper.sweep_once().await;

    assert_eq!(h.tasks.get(&task_id).unwrap().status, TaskStatus::Running);
}

#[tokio::test]
async fn sweep_fails_a_task_with_no_progress_within_the_threshold() {
    let h = harness(Duration::from_secs(60));
    let task_id = h.tasks.create_task(TaskKind::FullPipeline, Preferences::default()).unwrap();
    h.tasks.start_task(&task_id).unwrap();

    h.clock.advance_ms(61_000);
    h.reaper.sweep_once().await;

    let task = h.tasks.get(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error_kind, Some(spindle_core::task::ErrorKind::Stuck));

    let (replay, _rx) = h.progress.subscribe(task_id.as_str(), 10);
    assert!(replay.iter().any(|e| matches!(e, ProgressEvent::TaskError { error_kind: spindle_core::task::ErrorKind::Stuck, .. })));
}

#[tokio::test]
async fn comprehensive_reset_revokes_active_task_and_clears_its_progress_ring() {
    let h = harness(Duration::from_secs(60));
    let task_id = h.tasks.create_task(TaskKind::FullPipeline, Preferences::default()).unwrap();
    h.progress.publish(task_id.as_str(), ProgressEvent::TaskStatus { sequence: 0, is_running: false, current_phase_id: None, current_phase_message: None, started_at_ms: None, updated_at_ms: 1_000 });

    let reset = h.reaper.comprehensive_reset().await.unwrap();

    assert_eq!(reset, vec![task_id.clone()]);
    assert_eq!(h.tasks.get(&task_id).unwrap().status, TaskStatus::Revoked);
    let (replay, _rx) = h.progress.subscribe(task_id.as_str(), 10);
    assert!(replay.is_empty());
}

#[tokio::test]
async fn archive_old_tasks_only_archives_past_retention() {
    let h = harness(Duration::from_secs(60));
    let old = h.tasks.create_task(TaskKind::FullPipeline, Preferences::default()).unwrap();
    h.tasks.start_task(&old).unwrap();
    h.tasks.succeed_task(&old, None).unwrap();

    h.clock.advance_ms(10 * 86_400_000);
    let recent = h.tasks.create_task(TaskKind::FullPipeline, Preferences::default()).unwrap();
    h.tasks.start_task(&recent).unwrap();
    h.tasks.succeed_task(&recent, None).unwrap();

    let archived = h.reaper.archive_old_tasks(Duration::from_secs(5 * 86_400)).unwrap();

    assert_eq!(archived, 1);
    assert!(h.tasks.get(&old).unwrap().is_archived);
    assert!(!h.tasks.get(&recent).unwrap().is_archived);
}
