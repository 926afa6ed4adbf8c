// SPDX-License-Identifier: MIT

//! IPC protocol between `spindle-cli` and `spindle-daemon`.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

mod request;
mod response;
mod wire;

pub use request::Request;
pub use response::{LogPage, Response, TaskDetail, TaskSummary};
pub use wire::{decode, encode, read_message, read_request, read_response, write_message, write_request, write_response, ProtocolError};

#[cfg(test)]
mod property_tests;
