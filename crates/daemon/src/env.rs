// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Protocol version advertised in the `Hello` handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the state directory: `SPINDLE_STATE_DIR` > `XDG_STATE_HOME/spindle`
/// > `~/.local/state/spindle`.
pub fn state_dir() -> Result<PathBuf, std::env::VarError> {
    if let Ok(dir) = std::env::var("SPINDLE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("spindle"));
    }
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".local/state/spindle"))
}

/// Per-request read/write timeout.
pub fn ipc_timeout() -> Duration {
    std::env::var("SPINDLE_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP port for remote connections. When set, the daemon listens on this
/// port in addition to the Unix socket.
pub fn tcp_port() -> Option<u16> {
    std::env::var("SPINDLE_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Auth token required of TCP clients in the `Hello` handshake. Unix
/// connections are implicitly trusted and never checked against this.
pub fn auth_token() -> Option<String> {
    std::env::var("SPINDLE_AUTH_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Grace period for in-flight requests on shutdown.
pub fn drain_timeout() -> Duration {
    std::env::var("SPINDLE_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Reaper sweep period override; defaults to half of `task.stuck_threshold`
/// (spec.md §4.10) when unset.
pub fn reaper_sweep_ms() -> Option<Duration> {
    std::env::var("SPINDLE_REAPER_SWEEP_MS").ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn ipc_timeout_defaults_to_five_seconds() {
        std::env::remove_var("SPINDLE_IPC_TIMEOUT_MS");
        assert_eq!(ipc_timeout(), Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn auth_token_treats_empty_string_as_unset() {
        std::env::set_var("SPINDLE_AUTH_TOKEN", "");
        assert_eq!(auth_token(), None);
        std::env::remove_var("SPINDLE_AUTH_TOKEN");
    }
}
