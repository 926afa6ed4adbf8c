// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;

#[yare::parameterized(
    secs_30 = { "30s", Duration::from_secs(30) },
    mins_5 = { "5m", Duration::from_secs(300) },
    hours_2 = { "2h", Duration::from_secs(7200) },
    days_1 = { "1d", Duration::from_secs(86400) },
    bare_number = { "30", Duration::from_secs(30) },
    ws_leading = { " 30s ", Duration::from_secs(30) },
    ms_200 = { "200ms", Duration::from_millis(200) },
)]
fn parse_duration_valid(input: &str, expected: Duration) {
    assert_eq!(parse_duration(input).unwrap(), expected);
}

#[yare::parameterized(
    invalid_suffix = { "30x" },
    empty_string = { "" },
    invalid_number = { "abcs" },
)]
fn parse_duration_invalid(input: &str) {
    assert!(parse_duration(input).is_err());
}

#[test]
fn default_config_durations_all_parse() {
    let config = Config::default();
    assert!(config.handler_timeout().is_ok());
    assert!(config.cancel_deadline().is_ok());
    assert!(config.stuck_threshold().is_ok());
    assert!(config.archive_retention().is_ok());
}

#[test]
fn load_parses_toml_and_applies_key_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    std::fs::write(
        &path,
        r#"
        [task]
        handler_timeout = "1h"

        [worker]
        concurrency = 4
        "#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.task.handler_timeout, "1h");
    assert_eq!(config.worker.concurrency, 4);
    assert_eq!(config.bus.queue_name, "spindle-tasks");
}

#[test]
#[serial]
fn env_override_takes_precedence_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spindle.toml");
    std::fs::write(&path, "[worker]\nconcurrency = 1\n").unwrap();

    std::env::set_var("SPINDLE_WORKER_CONCURRENCY", "8");
    let config = Config::load(&path).unwrap();
    std::env::remove_var("SPINDLE_WORKER_CONCURRENCY");

    assert_eq!(config.worker.concurrency, 8);
}
