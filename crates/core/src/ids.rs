// SPDX-License-Identifier: MIT

//! Identifiers used across the orchestration substrate.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

crate::define_id! {
    /// Unique identifier for a single pipeline execution.
    pub struct TaskId("tsk-");
}

crate::define_id! {
    /// Delivery handle for a single reserved message bus lease.
    pub struct DeliveryId("dly-");
}

/// Stable identifier for a content unit flowing through the pipeline.
///
/// Unlike [`TaskId`], item IDs are not generated by this system — they
/// are assigned by the upstream ingest source (e.g. a post ID) and must
/// compare and order the same way every time for Planner determinism
/// (spec property 2).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(SmolStr);

impl ItemId {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

/// Identifier for one stage in the pipeline DAG (e.g. `"categorize"`).
///
/// A closed set in practice (defined by the [`HandlerRegistry`](crate) at
/// startup) but represented as an interned string rather than an enum so
/// `custom` run-mode stage sets and handler plug-ins don't require a
/// recompile to add a stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(SmolStr);

impl StageId {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for StageId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

/// The ten well-known stages from the pipeline DAG (spec.md §4.5).
pub mod stage {
    pub const FETCH: &str = "fetch";
    pub const CACHE: &str = "cache";
    pub const MEDIA: &str = "media";
    pub const CATEGORIZE: &str = "categorize";
    pub const GENERATE: &str = "generate";
    pub const DB_SYNC: &str = "db_sync";
    pub const SYNTHESIZE: &str = "synthesize";
    pub const EMBED: &str = "embed";
    pub const README: &str = "readme";
    pub const GIT_SYNC: &str = "git_sync";

    /// The full pipeline in dependency order.
    pub const FULL_ORDER: &[&str] = &[
        FETCH, CACHE, MEDIA, CATEGORIZE, GENERATE, DB_SYNC, SYNTHESIZE, EMBED, README, GIT_SYNC,
    ];
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
