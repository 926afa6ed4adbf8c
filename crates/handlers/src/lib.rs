// SPDX-License-Identifier: MIT

//! C6: the Stage Handler plug-in contract. Every pipeline stage
//! (cache/media/categorize/generate/db_sync/synthesize/embed/readme/git_sync,
//! and fetch) implements [`StageHandler`] and is looked up by `StageId` from
//! a [`HandlerRegistry`] built once at daemon startup, grounded on the
//! teacher's `Arc<dyn AgentAdapter>` trait-object pattern.

mod context;
mod error;
mod registry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use context::StageContext;
pub use error::HandlerError;
pub use registry::{HandlerRegistry, StageHandlerDecl};

use async_trait::async_trait;
use spindle_core::ids::ItemId;
use spindle_core::StageId;

/// Point-in-time estimate for a UI preview, before any work is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDescription {
    pub stage_id: StageId,
    pub total_estimated_items: usize,
}

/// One unit of item-level output from a stage run: a patch the caller
/// applies to the Item Repository via `ItemRepository::update_derived` /
/// `set_flag` (spec.md §4.6's `item_updates` field, split into the two
/// repository operations that actually exist rather than a generic patch
/// object).
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub derived: Option<spindle_core::ItemDerived>,
    pub mark_done: bool,
}

/// Outcome of one `StageHandler::execute` call.
#[derive(Debug, Clone, Default)]
pub struct StageResult {
    pub processed_count: u64,
    pub total_count: u64,
    pub error_count: u64,
    pub item_updates: Vec<(ItemId, ItemPatch)>,
    pub summary: Option<String>,
}

/// A single pipeline stage's behavior.
///
/// Implementations must be idempotent per item (re-running on an item
/// already in its target state is a no-op success), must poll
/// `StageContext::is_cancelled` between items and return promptly once it
/// fires, and must not call another `StageHandler` directly — all
/// cross-stage communication happens through the Item Repository.
#[async_trait]
pub trait StageHandler: Send + Sync + 'static {
    fn stage_id(&self) -> StageId;

    /// Cheap, side-effect-free estimate for UI previews.
    fn plan_description(&self, items_in_scope: usize) -> PlanDescription {
        PlanDescription { stage_id: self.stage_id(), total_estimated_items: items_in_scope }
    }

    async fn execute(&self, ctx: &StageContext, items: &[ItemId]) -> Result<StageResult, HandlerError>;
}
