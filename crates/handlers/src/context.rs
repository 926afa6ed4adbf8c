// SPDX-License-Identifier: MIT

use spindle_bus::{ProgressBus, ProgressEvent};
use spindle_core::{Directives, TaskId};
use spindle_storage::ItemRepository;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Type-erased slot for the "opaque handles for external collaborators"
/// spec.md §4.6 grants a handler access to (LLM client, HTTP client, git
/// client, ...). This repo ships no concrete collaborator implementations —
/// that is the pipeline content logic, not the orchestration substrate —
/// only the registry a real deployment would populate at daemon startup.
#[derive(Default, Clone)]
pub struct Collaborators(HashMap<TypeId, Arc<dyn Any + Send + Sync>>);

impl Collaborators {
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.0.insert(TypeId::of::<T>(), value);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.0.get(&TypeId::of::<T>()).and_then(|v| v.clone().downcast::<T>().ok())
    }
}

/// Everything a `StageHandler::execute` call needs, bundled so the trait
/// signature doesn't grow a parameter per capability (spec.md §4.6).
pub struct StageContext {
    pub task_id: TaskId,
    pub directives: Directives,
    pub items: Arc<ItemRepository>,
    progress: Arc<ProgressBus>,
    cancel: CancellationToken,
    pub max_concurrent_items: u32,
    pub collaborators: Collaborators,
}

impl StageContext {
    pub fn new(
        task_id: TaskId,
        directives: Directives,
        items: Arc<ItemRepository>,
        progress: Arc<ProgressBus>,
        cancel: CancellationToken,
        max_concurrent_items: u32,
    ) -> Self {
        Self { task_id, directives, items, progress, cancel, max_concurrent_items, collaborators: Collaborators::default() }
    }

    /// Handlers must check this between items and return promptly once it
    /// is set (spec.md §4.6 cancellation contract).
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Publish a progress event at least once per completed item, or at a
    /// throttled rate for high-cardinality stages (spec.md §4.6).
    pub fn emit(&self, event: ProgressEvent) {
        self.progress.publish(self.task_id.as_str(), event);
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
