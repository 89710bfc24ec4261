use async_trait::async_trait;

use crate::{
    command::RestoreCommand, exception::SnapshotResult, model::vo::RestoreOutcome,
    service::DirectoryService,
};

#[async_trait]
pub trait RestoreService: Send + Sync {
    /// Replay a stored snapshot onto a live workspace.
    ///
    /// Loading errors abort before the workspace is touched. Once stages
    /// start, single entity failures are recorded in the outcome and skipped.
    async fn restore(
        &self,
        directory: &dyn DirectoryService,
        cmd: RestoreCommand,
    ) -> SnapshotResult<RestoreOutcome>;
}
