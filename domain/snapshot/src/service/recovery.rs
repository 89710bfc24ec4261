use async_trait::async_trait;

use crate::{model::vo::LiveMember, service::DirectoryService};

#[async_trait]
pub trait RoleRecoveryService: Send + Sync {
    /// Give a (re)joining member back the roles the newest readable snapshot
    /// knew them with, matched by role name. Returns the granted role ids.
    async fn recover(
        &self,
        directory: &dyn DirectoryService,
        member: &LiveMember,
    ) -> anyhow::Result<Vec<String>>;
}
