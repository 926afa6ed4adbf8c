// SPDX-License-Identifier: MIT

use std::io::IsTerminal;

mod codes {
    pub const HEADER: u8 = 74;
    pub const CONTEXT: u8 = 245;
    pub const MUTED: u8 = 240;
    pub const SUCCESS: u8 = 71;
    pub const FAILURE: u8 = 167;
    pub const RUNNING: u8 = 178;
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, else TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    fg256(codes::HEADER, text)
}

pub fn context(text: &str) -> String {
    fg256(codes::CONTEXT, text)
}

pub fn muted(text: &str) -> String {
    fg256(codes::MUTED, text)
}

/// Colors a task status string by its terminal outcome.
pub fn status(text: &str) -> String {
    let code = match text {
        "success" => codes::SUCCESS,
        "failed" | "revoked" => codes::FAILURE,
        "running" | "pending" => codes::RUNNING,
        _ => codes::MUTED,
    };
    fg256(code, text)
}
