// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the state directory, matching `spindle-daemon`'s resolution
/// order so the CLI finds the same socket the daemon bound.
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

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn state_dir_prefers_spindle_state_dir() {
        std::env::set_var("SPINDLE_STATE_DIR", "/tmp/spindle-cli-test-state");
        assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/spindle-cli-test-state"));
        std::env::remove_var("SPINDLE_STATE_DIR");
    }

    #[test]
    #[serial]
    fn ipc_timeout_defaults_to_five_seconds() {
        std::env::remove_var("SPINDLE_IPC_TIMEOUT_MS");
        assert_eq!(ipc_timeout(), Duration::from_secs(5));
    }
}
