// SPDX-License-Identifier: MIT

use super::*;
use spindle_core::{ids::TaskId, TaskEvent};
use tempfile::tempdir;

fn test_event(label: &str) -> TaskEvent {
    TaskEvent::TaskArchived { id: TaskId::from_string(format!("tsk-test-{label}")) }
}

#[test]
fn open_creates_active_segment() {
    let dir = tempdir().unwrap();
    let wal: Wal<TaskEvent> = Wal::open(dir.path(), 0).unwrap();
    assert!(dir.path().join("active.jsonl").exists());
    assert_eq!(wal.write_seq(), 0);
    assert_eq!(wal.processed_seq(), 0);
}

#[test]
fn append_assigns_increasing_sequence_numbers() {
    let dir = tempdir().unwrap();
    let mut wal: Wal<TaskEvent> = Wal::open(dir.path(), 0).unwrap();

    let seq1 = wal.append(&test_event("a")).unwrap();
    let seq2 = wal.append(&test_event("b")).unwrap();

    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);
    wal.flush().unwrap();
}

#[test]
fn next_unprocessed_returns_entries_in_order() {
    let dir = tempdir().unwrap();
    let mut wal: Wal<TaskEvent> = Wal::open(dir.path(), 0).unwrap();

    wal.append(&test_event("a")).unwrap();
    wal.append(&test_event("b")).unwrap();
    wal.flush().unwrap();

    let entry1 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry1.seq, 1);
    wal.mark_processed(entry1.seq);

    let entry2 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry2.seq, 2);
    wal.mark_processed(entry2.seq);

    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn mark_processed_advances_processed_seq() {
    let dir = tempdir().unwrap();
    let mut wal: Wal<TaskEvent> = Wal::open(dir.path(), 0).unwrap();
    wal.append(&test_event("a")).unwrap();
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    wal.mark_processed(entry.seq);

    assert_eq!(wal.processed_seq(), 1);
}

#[test]
fn reopen_recovers_write_seq_from_disk() {
    let dir = tempdir().unwrap();
    {
        let mut wal: Wal<TaskEvent> = Wal::open(dir.path(), 0).unwrap();
        wal.append(&test_event("a")).unwrap();
        wal.append(&test_event("b")).unwrap();
        wal.flush().unwrap();
    }

    let wal: Wal<TaskEvent> = Wal::open(dir.path(), 1).unwrap();
    assert_eq!(wal.write_seq(), 2);
    assert_eq!(wal.processed_seq(), 1);
}
