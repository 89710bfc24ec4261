use async_trait::async_trait;
use mockall::mock;

use crate::{
    model::{
        entity::HistoryEntry,
        vo::{LiveChannel, LiveMember, LiveRole, NewChannel, NewRole, WorkspaceProfile},
    },
    repository::HistoryRepo,
    service::DirectoryService,
};

mock! {
    pub DirectoryService {}
    #[async_trait]
    impl DirectoryService for DirectoryService {
        async fn profile(&self) -> anyhow::Result<WorkspaceProfile>;
        async fn roles(&self) -> anyhow::Result<Vec<LiveRole>>;
        async fn channels(&self) -> anyhow::Result<Vec<LiveChannel>>;
        async fn members(&self) -> anyhow::Result<Vec<LiveMember>>;
        async fn authority_position(&self) -> anyhow::Result<i64>;
        async fn set_identity(&self, name: &str, icon_ref: Option<String>) -> anyhow::Result<()>;
        async fn create_role(&self, role: NewRole) -> anyhow::Result<String>;
        async fn delete_role(&self, id: &str, reason: &str) -> anyhow::Result<()>;
        async fn create_channel(&self, channel: NewChannel) -> anyhow::Result<String>;
        async fn delete_channel(&self, id: &str, reason: &str) -> anyhow::Result<()>;
        async fn grant_roles(
            &self,
            member_id: &str,
            role_ids: &[String],
            reason: &str,
        ) -> anyhow::Result<()>;
    }
}

mock! {
    pub HistoryRepo {}
    #[async_trait]
    impl HistoryRepo for HistoryRepo {
        async fn append(&self, entry: &HistoryEntry) -> anyhow::Result<()>;
        async fn list(&self) -> anyhow::Result<Vec<HistoryEntry>>;
    }
}
