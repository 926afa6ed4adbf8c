// SPDX-License-Identifier: MIT

use super::*;
use spindle_bus::{InMemoryBus, MessageBus, ProgressBus};
use spindle_core::{Clock, FakeClock};
use spindle_engine::{Controller, Reaper};
use spindle_storage::TaskStore;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

fn ctx() -> (ListenCtx, TempDir) {
    let dir = TempDir::new().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(1_000));
    let tasks = Arc::new(TaskStore::open(dir.path(), Arc::clone(&clock)).unwrap());
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new(Arc::clone(&clock)));
    let progress = Arc::new(ProgressBus::default());
    let controller = Arc::new(Controller::new(Arc::clone(&tasks), Arc::clone(&bus), Arc::clone(&progress), "spindle-tasks"));
    let reaper = Arc::new(Reaper::new(Arc::clone(&tasks), bus, Arc::clone(&progress), clock, Duration::from_secs(600)));
    let ctx = ListenCtx {
        tasks,
        controller,
        progress,
        reaper,
        config: spindle_core::Config::default(),
        start_time: std::time::Instant::now(),
        auth_token: None,
        shutdown: Arc::new(Notify::new()),
    };
    (ctx, dir)
}

#[tokio::test]
async fn ping_returns_pong() {
    let (ctx, _dir) = ctx();
    assert!(matches!(handle_request(Request::Ping, &ctx).await, Response::Pong));
}

#[tokio::test]
async fn hello_echoes_the_protocol_version() {
    let (ctx, _dir) = ctx();
    let response = handle_request(Request::Hello { version: "0".to_string(), token: None }, &ctx).await;
    assert_eq!(response, Response::Hello { version: PROTOCOL_VERSION.to_string() });
}

#[tokio::test]
async fn start_task_then_get_task_round_trips() {
    let (ctx, _dir) = ctx();
    let response = handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() }, &ctx).await;
    let Response::TaskStarted { task_id } = response else { panic!("expected TaskStarted, got {response:?}") };

    let response = handle_request(Request::GetTask { task_id: task_id.clone() }, &ctx).await;
    match response {
        Response::Task { task: Some(task) } => assert_eq!(task.id, task_id),
        other => panic!("expected Task, got {other:?}"),
    }
}

#[tokio::test]
async fn get_task_on_unknown_id_is_not_found() {
    let (ctx, _dir) = ctx();
    let task_id = TaskId::new();
    let response = handle_request(Request::GetTask { task_id: task_id.clone() }, &ctx).await;
    assert_eq!(response, Response::NotFound { task_id });
}

#[tokio::test]
async fn second_start_task_reports_already_active() {
    let (ctx, _dir) = ctx();
    handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() }, &ctx).await;

    let response = handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() }, &ctx).await;
    assert!(matches!(response, Response::TaskAlreadyActive { .. }));
}

#[tokio::test]
async fn start_task_with_contradictory_preferences_is_rejected() {
    let (ctx, _dir) = ctx();
    let mut prefs = Preferences::default();
    prefs.skip.insert("cache".to_string());
    prefs.force.insert("cache".to_string());

    let response = handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: prefs }, &ctx).await;
    assert!(matches!(response, Response::ContradictoryDirectives { .. }));
}

#[tokio::test]
async fn cancel_task_on_unknown_id_is_not_found() {
    let (ctx, _dir) = ctx();
    let task_id = TaskId::new();
    let response = handle_request(Request::CancelTask { task_id: task_id.clone() }, &ctx).await;
    assert_eq!(response, Response::NotFound { task_id });
}

#[tokio::test]
async fn list_tasks_reports_the_total_and_paginates() {
    let (ctx, _dir) = ctx();
    for _ in 0..3 {
        handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() }, &ctx).await;
        if let Response::Task { task: Some(task) } = handle_request(Request::GetActiveTask, &ctx).await {
            ctx.tasks.cancel_task(&task.id).unwrap();
        }
    }

    let response = handle_request(Request::ListTasks { status: None, kind: None, limit: 2, offset: 0 }, &ctx).await;
    match response {
        Response::Tasks { tasks, total } => {
            assert_eq!(total, 3);
            assert_eq!(tasks.len(), 2);
        }
        other => panic!("expected Tasks, got {other:?}"),
    }
}

#[tokio::test]
async fn admin_reset_revokes_the_active_task() {
    let (ctx, _dir) = ctx();
    let response = handle_request(Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() }, &ctx).await;
    let Response::TaskStarted { task_id } = response else { panic!("expected TaskStarted") };

    let response = handle_request(Request::AdminReset, &ctx).await;
    match response {
        Response::ResetDone { reset_task_ids } => assert_eq!(reset_task_ids, vec![task_id.clone()]),
        other => panic!("expected ResetDone, got {other:?}"),
    }
    assert_eq!(ctx.tasks.get(&task_id).unwrap().status, spindle_core::TaskStatus::Revoked);
}

#[tokio::test]
async fn admin_archive_rejects_an_unparsable_duration() {
    let (ctx, _dir) = ctx();
    let response = handle_request(Request::AdminArchive { older_than: Some("not-a-duration".to_string()) }, &ctx).await;
    assert!(matches!(response, Response::Error { .. }));
}

#[test]
fn event_kind_tag_names_every_variant() {
    use spindle_bus::ProgressEvent;
    let event = ProgressEvent::TaskCompleted { sequence: 0, status: "success".to_string(), result_summary: None, duration_seconds: 0 };
    assert_eq!(event_kind_tag(&event), "TaskCompleted");
}
