pub mod jsonl_source;

use crate::model::EventBatch;
use async_trait::async_trait;
use swapledger_core::Result;

/// A paged source of chain events. Implementations must yield events in
/// chain order, both within a page and across consecutive pages of one
/// cursor chain.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the next page of events after `cursor`. `None` starts from
    /// the beginning of the stream.
    async fn fetch_page(&self, cursor: Option<String>) -> Result<EventBatch>;

    /// Stable identifier for this source, used to key checkpoints.
    fn source_id(&self) -> &str;

    async fn health_check(&self) -> Result<()>;
}

pub use jsonl_source::JsonlSource;
