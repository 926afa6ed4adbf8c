// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::TaskId;

#[test]
fn start_task_round_trips_through_json() {
    let request = Request::StartTask { kind: TaskKind::FullPipeline, preferences: Preferences::default() };
    let json = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn variant_is_tagged_by_type() {
    let request = Request::GetActiveTask;
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["type"], "GetActiveTask");
}

#[test]
fn hello_carries_version_and_optional_token() {
    let request = Request::Hello { version: "1".to_string(), token: None };
    let json = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn cancel_task_carries_the_task_id() {
    let task_id = TaskId::new();
    let request = Request::CancelTask { task_id: task_id.clone() };
    let json = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, Request::CancelTask { task_id });
}
