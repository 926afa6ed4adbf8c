// SPDX-License-Identifier: MIT

//! Shared daemon context threaded through every request handler.

use spindle_bus::ProgressBus;
use spindle_core::Config;
use spindle_engine::{Controller, Reaper};
use spindle_storage::TaskStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;

/// Everything a connection handler needs to serve a [`spindle_wire::Request`].
pub struct ListenCtx {
    pub tasks: Arc<TaskStore>,
    pub controller: Arc<Controller>,
    pub progress: Arc<ProgressBus>,
    pub reaper: Arc<Reaper>,
    pub config: Config,
    pub start_time: Instant,
    /// Auth token for TCP connections (`SPINDLE_AUTH_TOKEN`). Unix
    /// connections are implicitly trusted and never checked against this.
    pub auth_token: Option<String>,
    pub shutdown: Arc<Notify>,
}

impl ListenCtx {
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
