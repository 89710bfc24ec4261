use async_trait::async_trait;

use crate::model::entity::HistoryEntry;

/// Append-only log of captures and restores.
#[async_trait]
pub trait HistoryRepo: Send + Sync {
    async fn append(&self, entry: &HistoryEntry) -> anyhow::Result<()>;
    /// Newest first by entry timestamp.
    async fn list(&self) -> anyhow::Result<Vec<HistoryEntry>>;
}
