use async_trait::async_trait;

use crate::model::vo::{LiveChannel, LiveMember, LiveRole, NewChannel, NewRole, WorkspaceProfile};

/// A live workspace as exposed by the remote directory.
///
/// Every method is a remote call that can fail on its own. Callers issue them
/// one at a time.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn profile(&self) -> anyhow::Result<WorkspaceProfile>;
    /// All roles, including "everyone".
    async fn roles(&self) -> anyhow::Result<Vec<LiveRole>>;
    async fn channels(&self) -> anyhow::Result<Vec<LiveChannel>>;
    async fn members(&self) -> anyhow::Result<Vec<LiveMember>>;
    /// Position of the highest role held by the identity doing the changes.
    /// Only roles strictly below it can be deleted.
    async fn authority_position(&self) -> anyhow::Result<i64>;
    /// `None` leaves the current icon in place.
    async fn set_identity(&self, name: &str, icon_ref: Option<String>) -> anyhow::Result<()>;
    /// Returns the new role id.
    async fn create_role(&self, role: NewRole) -> anyhow::Result<String>;
    async fn delete_role(&self, id: &str, reason: &str) -> anyhow::Result<()>;
    /// Returns the new channel id.
    async fn create_channel(&self, channel: NewChannel) -> anyhow::Result<String>;
    async fn delete_channel(&self, id: &str, reason: &str) -> anyhow::Result<()>;
    async fn grant_roles(&self, member_id: &str, role_ids: &[String], reason: &str)
        -> anyhow::Result<()>;
}
