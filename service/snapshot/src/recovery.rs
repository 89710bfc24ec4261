use async_trait::async_trait;
use std::sync::Arc;

use domain_snapshot::{
    model::{entity::Snapshot, vo::LiveMember},
    repository::SnapshotRepo,
    service::{DirectoryService, RoleRecoveryService},
};
use typed_builder::TypedBuilder;

const RECOVERY_REASON: &str = "Automatic role recovery";

/// Grants a joining member the roles they held in the newest plaintext
/// snapshot that knew them. Roles are matched by name since ids don't
/// survive a restore.
#[derive(TypedBuilder)]
pub struct RoleRecoveryServiceImpl {
    snapshot_repo: Arc<dyn SnapshotRepo>,
}

impl RoleRecoveryServiceImpl {
    /// Newest readable snapshot in which `member_id` held at least one role.
    async fn latest_with_roles(&self, member_id: &str) -> anyhow::Result<Option<Snapshot>> {
        let metas = self.snapshot_repo.list().await?;
        for meta in metas
            .into_iter()
            .filter(|el| !el.is_encrypted && !el.is_corrupted)
        {
            let snapshot = match self.snapshot_repo.get(&meta.id, None).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::debug!(id = %meta.id, "Skipping unreadable snapshot: {e}");
                    continue;
                }
            };
            let holds_roles = snapshot
                .member(member_id)
                .is_some_and(|el| !el.role_source_ids.is_empty());
            if holds_roles {
                return Ok(Some(snapshot));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl RoleRecoveryService for RoleRecoveryServiceImpl {
    async fn recover(
        &self,
        directory: &dyn DirectoryService,
        member: &LiveMember,
    ) -> anyhow::Result<Vec<String>> {
        if member.is_bot {
            return Ok(vec![]);
        }
        let Some(snapshot) = self.latest_with_roles(&member.id).await? else {
            return Ok(vec![]);
        };
        let Some(record) = snapshot.member(&member.id) else {
            return Ok(vec![]);
        };

        let live_roles = directory.roles().await?;
        let mut role_ids: Vec<String> = vec![];
        for name in record
            .role_source_ids
            .iter()
            .filter_map(|el| snapshot.role(el))
            .map(|el| el.name.as_str())
        {
            let found = live_roles
                .iter()
                .find(|el| el.name == name && !el.managed && !el.is_everyone);
            match found {
                Some(role) if !role_ids.contains(&role.id) => role_ids.push(role.id.to_owned()),
                Some(_) => {}
                None => tracing::debug!(member = %member.id, role = name, "No live role with this name."),
            }
        }
        if role_ids.is_empty() {
            return Ok(role_ids);
        }

        if let Err(e) = directory.grant_roles(&member.id, &role_ids, RECOVERY_REASON).await {
            tracing::warn!(member = %member.id, snapshot = %snapshot.id, "Role recovery failed: {e:#}");
            return Ok(vec![]);
        }
        tracing::info!(
            member = %member.id,
            snapshot = %snapshot.id,
            roles = role_ids.len(),
            "Recovered member roles."
        );
        Ok(role_ids)
    }
}
