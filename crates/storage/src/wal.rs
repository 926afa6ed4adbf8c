// SPDX-License-Identifier: MIT

//! Append-only write-ahead log. Every durable mutation is appended here
//! before it is applied to in-memory [`MaterializedState`](crate::state::MaterializedState),
//! so a crash between the two leaves nothing lost — replay on restart
//! reconstructs state from the log.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("corrupt WAL entry at seq {seq}: {source}")]
    Decode { seq: u64, #[source] source: serde_json::Error },
}

/// One durably appended record, tagged with its position in the log.
#[derive(Debug, Clone)]
pub struct WalEntry<E> {
    pub seq: u64,
    pub event: E,
}

/// A segment-backed, JSON-lines write-ahead log for events of type `E`.
///
/// Segments beyond [`ROLLOVER_BYTES`] are rotated and zstd-compressed
/// (`segment.N.jsonl.zst`) rather than left to grow without bound; the
/// active segment is always plain JSON lines for crash-safe appends.
pub struct Wal<E> {
    dir: PathBuf,
    active_path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    bytes_since_rollover: u64,
    _marker: PhantomData<E>,
}

const ROLLOVER_BYTES: u64 = 64 * 1024 * 1024;

impl<E> Wal<E>
where
    E: Serialize + DeserializeOwned,
{
    /// Open (creating if absent) the WAL rooted at `dir`, with a starting
    /// `processed_seq` recovered from the last checkpoint.
    pub fn open(dir: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|source| WalError::Io { path: dir.display().to_string(), source })?;
        let active_path = dir.join("active.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&active_path)
            .map_err(|source| WalError::Io { path: active_path.display().to_string(), source })?;
        let bytes_since_rollover = file
            .metadata()
            .map_err(|source| WalError::Io { path: active_path.display().to_string(), source })?
            .len();

        let mut wal = Self {
            dir,
            active_path,
            file,
            write_seq: 0,
            processed_seq,
            bytes_since_rollover,
            _marker: PhantomData,
        };
        wal.write_seq = wal.scan_max_seq()?;
        Ok(wal)
    }

    fn scan_max_seq(&self) -> Result<u64, WalError> {
        let reader = BufReader::new(
            File::open(&self.active_path)
                .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?,
        );
        let mut max_seq = 0;
        for line in reader.lines() {
            let line = line.map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;
            if line.is_empty() {
                continue;
            }
            let (seq, _) = decode_line::<E>(&line)?;
            max_seq = max_seq.max(seq);
        }
        Ok(max_seq)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append `event`, returning its assigned sequence number. Not flushed
    /// to disk until [`Wal::flush`] is called.
    pub fn append(&mut self, event: &E) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let line = serde_json::to_string(&Record { seq, event }).map_err(|source| WalError::Decode { seq, source })?;
        writeln!(self.file, "{line}")
            .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;
        self.write_seq = seq;
        self.bytes_since_rollover += line.len() as u64 + 1;
        Ok(seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush().map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;
        if self.bytes_since_rollover >= ROLLOVER_BYTES {
            self.rollover()?;
        }
        Ok(())
    }

    /// Compress the current active segment and start a fresh one. Replay
    /// never needs to read rolled-over segments directly — they exist
    /// purely as compressed history once a snapshot covers their range.
    fn rollover(&mut self) -> Result<(), WalError> {
        let archived = self.dir.join(format!("segment.{}.jsonl.zst", self.write_seq));
        let raw = std::fs::read(&self.active_path)
            .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;
        let compressed =
            zstd::encode_all(raw.as_slice(), 3).map_err(|source| WalError::Io { path: archived.display().to_string(), source })?;
        std::fs::write(&archived, compressed)
            .map_err(|source| WalError::Io { path: archived.display().to_string(), source })?;

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .open(&self.active_path)
            .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;
        self.bytes_since_rollover = 0;
        Ok(())
    }

    /// Read the next entry after `processed_seq` without advancing it.
    /// Callers apply the entry to materialized state, then call
    /// [`Wal::mark_processed`].
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry<E>>, WalError> {
        let mut content = String::new();
        File::open(&self.active_path)
            .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?
            .read_to_string(&mut content)
            .map_err(|source| WalError::Io { path: self.active_path.display().to_string(), source })?;

        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let (seq, event) = decode_line::<E>(line)?;
            if seq > self.processed_seq {
                return Ok(Some(WalEntry { seq, event }));
            }
        }
        Ok(None)
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }
}

#[derive(serde::Serialize)]
struct Record<'a, E> {
    seq: u64,
    event: &'a E,
}

#[derive(serde::Deserialize)]
struct OwnedRecord<E> {
    seq: u64,
    event: E,
}

fn decode_line<E: DeserializeOwned>(line: &str) -> Result<(u64, E), WalError> {
    let record: OwnedRecord<E> =
        serde_json::from_str(line).map_err(|source| WalError::Decode { seq: 0, source })?;
    Ok((record.seq, record.event))
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
