// SPDX-License-Identifier: MIT

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete materialized state at a point in time,
//! identified by the WAL sequence number it was taken at. Recovery loads
//! the snapshot, then replays WAL entries after that sequence.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<S> {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: S,
    pub created_at_ms: u64,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Atomically write a snapshot: serialize to a `.tmp` path, rotate any
/// existing file to `.bak`, then rename the temp file into place.
pub fn save<S: Serialize>(path: &Path, seq: u64, state: &S, now_ms: u64) -> Result<(), SnapshotError> {
    let snapshot = Snapshot { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at_ms: now_ms };
    let encoded = serde_json::to_vec(&snapshot)?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &encoded).map_err(|source| SnapshotError::Io { path: tmp_path.display().to_string(), source })?;

    if path.exists() {
        let bak_path = rotate_bak_path(path);
        fs::rename(path, &bak_path).map_err(|source| SnapshotError::Io { path: bak_path.display().to_string(), source })?;
    }
    fs::rename(&tmp_path, path).map_err(|source| SnapshotError::Io { path: path.display().to_string(), source })?;
    Ok(())
}

/// Load the most recent snapshot at `path`, or `None` if it doesn't exist.
pub fn load<S: DeserializeOwned>(path: &Path) -> Result<Option<Snapshot<S>>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path).map_err(|source| SnapshotError::Io { path: path.display().to_string(), source })?;
    let snapshot: Snapshot<S> = serde_json::from_slice(&raw)?;
    Ok(Some(snapshot))
}
