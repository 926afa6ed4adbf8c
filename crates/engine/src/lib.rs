// SPDX-License-Identifier: MIT

//! Task lifecycle runtime: the Task Controller (C7), Worker Runtime (C8),
//! and Monitor/Reaper (C10). Everything here sits on top of the Task
//! Store (C2), Item Repository (C4), Message Bus (C1), Progress Bus
//! (C3), and the Stage Handler registry (C6).

mod controller;
mod envelope;
mod error;
mod reaper;
mod worker;

pub use controller::Controller;
pub use envelope::TaskEnvelope;
pub use error::EngineError;
pub use reaper::Reaper;
pub use worker::Worker;
