// SPDX-License-Identifier: MIT

use crate::StageHandler;
use spindle_core::StageId;
use std::collections::HashMap;
use std::sync::Arc;

/// Static declaration used to build a [`HandlerRegistry`] at daemon
/// startup, grounded on the teacher's declarative adapter-construction
/// style (`RuntimeRouter` built from a fixed list of `(AgentRuntime,
/// Arc<dyn AgentAdapter>)` pairs).
pub struct StageHandlerDecl {
    pub stage_id: StageId,
    pub handler: Arc<dyn StageHandler>,
}

/// Lookup table from `StageId` to the handler that implements it.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<StageId, Arc<dyn StageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: StageHandlerDecl) {
        self.handlers.insert(decl.stage_id, decl.handler);
    }

    pub fn get(&self, stage_id: &StageId) -> Option<Arc<dyn StageHandler>> {
        self.handlers.get(stage_id).cloned()
    }

    pub fn contains(&self, stage_id: &StageId) -> bool {
        self.handlers.contains_key(stage_id)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
