// SPDX-License-Identifier: MIT

//! The work queue (C1) and the live progress pub/sub (C3). Both are
//! in-process implementations; either can be swapped for an
//! externally-backed equivalent without touching callers, since both
//! are accessed exclusively through their trait/struct surface here.

mod message_bus;
mod progress_bus;

pub use message_bus::{BusError, InMemoryBus, MessageBus, QueueItemStatus};
pub use progress_bus::{ProgressBus, ProgressEvent, SharedProgressBus};
