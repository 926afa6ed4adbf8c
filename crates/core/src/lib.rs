// SPDX-License-Identifier: MIT

//! Shared types for the `spindle` task-orchestration substrate: identifiers,
//! the task/item/plan data model, the event-sourcing vocabulary, and
//! runtime configuration. Every other crate in the workspace depends on
//! this one and nothing here depends back.

#[macro_use]
pub mod macros;

pub mod clock;
pub mod config;
pub mod events;
pub mod id;
pub mod ids;
pub mod item;
pub mod log_entry;
pub mod phase;
pub mod plan;
pub mod preferences;
pub mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError};
pub use events::{ItemEvent, TaskEvent};
pub use ids::{stage, DeliveryId, ItemId, StageId, TaskId};
pub use item::{Item, ItemDerived, ItemFlags};
pub use log_entry::{LogEntry, LogLevel};
pub use phase::{PhaseState, PhaseStatus};
pub use plan::{ExecutionPlan, IneligibleReason, StagePlan};
pub use preferences::{Directives, Preferences, PreferencesError, RunMode, SynthesisMode};
pub use task::{ErrorKind, Task, TaskKind, TaskStatus};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
