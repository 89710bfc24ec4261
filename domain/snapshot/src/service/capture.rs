use async_trait::async_trait;

use crate::{command::CaptureCommand, exception::SnapshotResult, service::DirectoryService};

#[async_trait]
pub trait CaptureService: Send + Sync {
    /// Walk the live workspace, persist a snapshot of it and record the
    /// capture in history. Returns the snapshot id.
    ///
    /// Nothing is persisted when any read fails.
    async fn capture(
        &self,
        directory: &dyn DirectoryService,
        cmd: CaptureCommand,
    ) -> SnapshotResult<String>;
}
