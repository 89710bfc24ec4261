use async_trait::async_trait;

use crate::{
    exception::SnapshotResult,
    model::{entity::Snapshot, vo::SnapshotMeta},
};

/// Durable snapshot files, one per snapshot id. Files are written once and
/// never modified.
#[async_trait]
pub trait SnapshotRepo: Send + Sync {
    /// Encode (and encrypt when `passphrase` is given) then persist.
    async fn insert(&self, snapshot: &Snapshot, passphrase: Option<&str>) -> anyhow::Result<String>;
    /// Read and decode. A missing file is `NotFound`, decoding failures keep
    /// their codec error.
    async fn get(&self, id: &str, passphrase: Option<&str>) -> SnapshotResult<Snapshot>;
    async fn exists(&self, id: &str) -> anyhow::Result<bool>;
    /// Stored bytes as they are on disk.
    async fn read_raw(&self, id: &str) -> SnapshotResult<Vec<u8>>;
    /// Newest first. Unreadable files are listed as corrupted, never an error.
    async fn list(&self) -> anyhow::Result<Vec<SnapshotMeta>>;
}
