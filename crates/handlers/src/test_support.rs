// SPDX-License-Identifier: MIT

//! Stage handler test doubles, gated the way the teacher gates
//! `FakeAgentAdapter`: available to this crate's own tests and to any
//! downstream crate that opts into the `test-support` feature.

use crate::{HandlerError, ItemPatch, StageContext, StageHandler, StageResult};
use async_trait::async_trait;
use spindle_core::ids::ItemId;
use spindle_core::StageId;
use std::time::Duration;

/// Completes every item instantly with no patch. Useful for stages whose
/// side effects don't matter to the test under scrutiny.
pub struct NoopHandler {
    stage_id: StageId,
}

impl NoopHandler {
    pub fn new(stage_id: impl Into<StageId>) -> Self {
        Self { stage_id: stage_id.into() }
    }
}

#[async_trait]
impl StageHandler for NoopHandler {
    fn stage_id(&self) -> StageId {
        self.stage_id.clone()
    }

    async fn execute(&self, ctx: &StageContext, items: &[ItemId]) -> Result<StageResult, HandlerError> {
        let mut updates = Vec::new();
        for item_id in items {
            if ctx.is_cancelled() {
                break;
            }
            updates.push((item_id.clone(), ItemPatch { mark_done: true, ..Default::default() }));
        }
        let processed = updates.len() as u64;
        Ok(StageResult { processed_count: processed, total_count: items.len() as u64, error_count: 0, item_updates: updates, summary: None })
    }
}

/// Always fails with the configured error, for exercising retry/dead-letter
/// and `FAILED` transitions.
pub struct FailingHandler {
    stage_id: StageId,
    message: String,
}

impl FailingHandler {
    pub fn new(stage_id: impl Into<StageId>, message: impl Into<String>) -> Self {
        Self { stage_id: stage_id.into(), message: message.into() }
    }
}

#[async_trait]
impl StageHandler for FailingHandler {
    fn stage_id(&self) -> StageId {
        self.stage_id.clone()
    }

    async fn execute(&self, _ctx: &StageContext, _items: &[ItemId]) -> Result<StageResult, HandlerError> {
        Err(HandlerError::Fatal(self.message.clone()))
    }
}

/// Succeeds overall but reports the first `failing_count` items as errored,
/// for exercising the partial-failure / `fail_fast` stage-completion rule.
pub struct PartialFailureHandler {
    stage_id: StageId,
    failing_count: u64,
}

impl PartialFailureHandler {
    pub fn new(stage_id: impl Into<StageId>, failing_count: u64) -> Self {
        Self { stage_id: stage_id.into(), failing_count }
    }
}

#[async_trait]
impl StageHandler for PartialFailureHandler {
    fn stage_id(&self) -> StageId {
        self.stage_id.clone()
    }

    async fn execute(&self, _ctx: &StageContext, items: &[ItemId]) -> Result<StageResult, HandlerError> {
        let error_count = self.failing_count.min(items.len() as u64);
        let updates: Vec<_> = items
            .iter()
            .skip(error_count as usize)
            .map(|item_id| (item_id.clone(), ItemPatch { mark_done: true, ..Default::default() }))
            .collect();
        Ok(StageResult { processed_count: items.len() as u64, total_count: items.len() as u64, error_count, item_updates: updates, summary: None })
    }
}

/// Sleeps longer than any sane `handler_timeout`/cancellation deadline in a
/// test, to exercise the Worker's timeout and cancellation paths.
pub struct SlowHandler {
    stage_id: StageId,
    per_item_delay: Duration,
}

impl SlowHandler {
    pub fn new(stage_id: impl Into<StageId>, per_item_delay: Duration) -> Self {
        Self { stage_id: stage_id.into(), per_item_delay }
    }
}

#[async_trait]
impl StageHandler for SlowHandler {
    fn stage_id(&self) -> StageId {
        self.stage_id.clone()
    }

    async fn execute(&self, ctx: &StageContext, items: &[ItemId]) -> Result<StageResult, HandlerError> {
        let mut updates = Vec::new();
        for item_id in items {
            if ctx.is_cancelled() {
                return Err(HandlerError::Cancelled);
            }
            tokio::time::sleep(self.per_item_delay).await;
            updates.push((item_id.clone(), ItemPatch { mark_done: true, ..Default::default() }));
        }
        let processed = updates.len() as u64;
        Ok(StageResult { processed_count: processed, total_count: items.len() as u64, error_count: 0, item_updates: updates, summary: None })
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
