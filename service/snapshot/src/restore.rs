use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use domain_snapshot::{
    command::RestoreCommand,
    exception::{SnapshotException, SnapshotResult},
    model::{
        entity::{ChannelRecord, HistoryEntry, Snapshot},
        vo::{
            ChannelKind, EntityOperation, GranteeKind, NewChannel, NewRole, PermissionOverwrite,
            RestoreOutcome, RestoreStage, StageReport, WorkspaceProfile,
        },
    },
    repository::{HistoryRepo, SnapshotRepo},
    service::{DirectoryService, RestoreService},
};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct RestoreServiceImpl {
    snapshot_repo: Arc<dyn SnapshotRepo>,
    history_repo: Arc<dyn HistoryRepo>,
}

/// Source id to destination id, filled as creations succeed.
type RemapTable = HashMap<String, String>;

/// State shared by the stages of one restore run.
struct Replay<'a> {
    directory: &'a dyn DirectoryService,
    snapshot: &'a Snapshot,
    destination: &'a WorkspaceProfile,
    reason: String,
}

fn log_attempt<T>(stage: RestoreStage, target: &str, result: &anyhow::Result<T>) {
    match result {
        Ok(_) => tracing::debug!(?stage, entity = target, "Restore step done."),
        Err(e) => tracing::warn!(?stage, entity = target, "Restore step failed, skipping: {e:#}"),
    }
}

impl Replay<'_> {
    async fn identity(&self) -> StageReport {
        let mut report = StageReport::new(RestoreStage::Identity);
        let result = self
            .directory
            .set_identity(
                &self.snapshot.source_name,
                self.snapshot.source_icon_ref.to_owned(),
            )
            .await;
        log_attempt(RestoreStage::Identity, &self.snapshot.source_name, &result);
        report.record(EntityOperation::SetIdentity, &self.snapshot.source_name, &result);
        report
    }

    async fn clear_roles(&self, report: &mut StageReport) {
        let live = match self.directory.roles().await {
            Ok(live) => live,
            Err(e) => {
                let result = Err::<(), _>(e);
                log_attempt(RestoreStage::Roles, "roles", &result);
                report.record(EntityOperation::FetchRoles, "roles", &result);
                return;
            }
        };
        let authority = match self.directory.authority_position().await {
            Ok(position) => position,
            Err(e) => {
                let result = Err::<(), _>(e);
                log_attempt(RestoreStage::Roles, "authority", &result);
                report.record(EntityOperation::FetchRoles, "authority", &result);
                return;
            }
        };
        for role in live
            .iter()
            .filter(|el| !el.is_everyone && !el.managed && el.position < authority)
        {
            let result = self.directory.delete_role(&role.id, &self.reason).await;
            log_attempt(RestoreStage::Roles, &role.name, &result);
            report.record(EntityOperation::DeleteRole, &role.name, &result);
        }
    }

    /// Creates roles highest position first. New roles are placed right
    /// above "everyone", so this order reproduces the captured hierarchy.
    async fn create_roles(&self, report: &mut StageReport) -> RemapTable {
        let mut records: Vec<_> = self.snapshot.roles.iter().collect();
        records.sort_by_key(|el| std::cmp::Reverse(el.position));

        let mut role_map = RemapTable::new();
        for record in records {
            let result = self
                .directory
                .create_role(NewRole {
                    name: record.name.to_owned(),
                    color: record.color_value(),
                    hoist: record.is_pinned,
                    permissions: record.permission_mask,
                    mentionable: record.is_mentionable,
                    position: record.position,
                    reason: self.reason.to_owned(),
                })
                .await;
            log_attempt(RestoreStage::Roles, &record.name, &result);
            report.record(EntityOperation::CreateRole, &record.name, &result);
            if let Ok(id) = result {
                role_map.insert(record.source_id.to_owned(), id);
            }
        }
        role_map
    }

    async fn grant_member_roles(
        &self,
        role_map: &RemapTable,
        report: &mut StageReport,
        outcome: &mut RestoreOutcome,
    ) {
        let live = match self.directory.members().await {
            Ok(live) => live,
            Err(e) => {
                let result = Err::<(), _>(e);
                log_attempt(RestoreStage::Roles, "members", &result);
                report.record(EntityOperation::FetchMembers, "members", &result);
                return;
            }
        };
        report.record(EntityOperation::FetchMembers, "members", &Ok::<_, String>(()));

        for record in &self.snapshot.members {
            if !live.iter().any(|el| el.id == record.source_id) {
                outcome.missing_members.push(record.label().to_owned());
                continue;
            }
            let role_ids: Vec<String> = record
                .role_source_ids
                .iter()
                .filter_map(|el| role_map.get(el).cloned())
                .collect();
            let dropped = record.role_source_ids.len() - role_ids.len();
            if dropped > 0 {
                tracing::debug!(
                    member = record.label(),
                    dropped,
                    "Roles without a recreated counterpart are not granted."
                );
            }
            if role_ids.is_empty() {
                continue;
            }
            let result = self
                .directory
                .grant_roles(&record.source_id, &role_ids, &self.reason)
                .await;
            log_attempt(RestoreStage::Roles, record.label(), &result);
            report.record(EntityOperation::GrantRoles, record.label(), &result);
        }
    }

    async fn roles(&self, outcome: &mut RestoreOutcome) -> (StageReport, RemapTable) {
        let mut report = StageReport::new(RestoreStage::Roles);
        self.clear_roles(&mut report).await;
        let role_map = self.create_roles(&mut report).await;
        self.grant_member_roles(&role_map, &mut report, outcome).await;
        (report, role_map)
    }

    /// Role grantees go through the role table, and the source workspace id
    /// (its "everyone" role) becomes the destination one. Other grantees are
    /// kept as captured.
    fn overwrites(&self, record: &ChannelRecord, role_map: &RemapTable) -> Vec<PermissionOverwrite> {
        let source_workspace = self.snapshot.source_workspace_id.as_deref();
        record
            .overwrites
            .iter()
            .map(|el| {
                let grantee_id = match el.grantee_kind {
                    GranteeKind::Role if source_workspace == Some(el.grantee_id.as_str()) => {
                        self.destination.id.to_owned()
                    }
                    GranteeKind::Role => role_map
                        .get(&el.grantee_id)
                        .cloned()
                        .unwrap_or_else(|| el.grantee_id.to_owned()),
                    GranteeKind::Member => el.grantee_id.to_owned(),
                };
                PermissionOverwrite {
                    grantee_id,
                    ..el.clone()
                }
            })
            .collect()
    }

    fn new_channel(
        &self,
        record: &ChannelRecord,
        parent_id: Option<String>,
        role_map: &RemapTable,
    ) -> NewChannel {
        let base = NewChannel {
            name: record.name.to_owned(),
            kind: record.kind,
            position: record.position,
            overwrites: self.overwrites(record, role_map),
            reason: self.reason.to_owned(),
            ..Default::default()
        };
        match record.kind {
            ChannelKind::Category => base,
            ChannelKind::Text => NewChannel {
                parent_id,
                topic: record.topic.to_owned(),
                nsfw: record.nsfw_flag,
                slow_mode_seconds: Some(record.slow_mode_seconds),
                ..base
            },
            ChannelKind::Announcement => NewChannel {
                parent_id,
                topic: record.topic.to_owned(),
                nsfw: record.nsfw_flag,
                ..base
            },
            ChannelKind::Voice => NewChannel {
                parent_id,
                topic: record.topic.to_owned(),
                nsfw: record.nsfw_flag,
                bitrate: record.bitrate_hz,
                user_limit: record.user_limit.filter(|el| *el > 0),
                ..base
            },
            ChannelKind::Unknown => NewChannel {
                kind: ChannelKind::Text,
                parent_id,
                topic: record.topic.to_owned(),
                nsfw: record.nsfw_flag,
                ..base
            },
        }
    }

    async fn clear_channels(&self, report: &mut StageReport) {
        let live = match self.directory.channels().await {
            Ok(live) => live,
            Err(e) => {
                let result = Err::<(), _>(e);
                log_attempt(RestoreStage::Channels, "channels", &result);
                report.record(EntityOperation::FetchChannels, "channels", &result);
                return;
            }
        };
        for channel in &live {
            let result = self.directory.delete_channel(&channel.id, &self.reason).await;
            log_attempt(RestoreStage::Channels, &channel.name, &result);
            report.record(EntityOperation::DeleteChannel, &channel.name, &result);
        }
    }

    async fn channels(&self, role_map: &RemapTable) -> StageReport {
        let mut report = StageReport::new(RestoreStage::Channels);
        self.clear_channels(&mut report).await;

        let mut categories: Vec<_> = self.snapshot.categories().collect();
        categories.sort_by_key(|el| el.position);
        let mut category_map = RemapTable::new();
        for record in categories {
            let result = self
                .directory
                .create_channel(self.new_channel(record, None, role_map))
                .await;
            log_attempt(RestoreStage::Channels, &record.name, &result);
            report.record(EntityOperation::CreateCategory, &record.name, &result);
            if let Ok(id) = result {
                category_map.insert(record.source_id.to_owned(), id);
            }
        }

        let mut others: Vec<_> = self.snapshot.non_categories().collect();
        others.sort_by_key(|el| el.position);
        for record in others {
            let parent_id = record
                .parent_source_id
                .as_ref()
                .and_then(|el| category_map.get(el).cloned());
            let result = self
                .directory
                .create_channel(self.new_channel(record, parent_id, role_map))
                .await;
            log_attempt(RestoreStage::Channels, &record.name, &result);
            report.record(EntityOperation::CreateChannel, &record.name, &result);
        }
        report
    }
}

#[async_trait]
impl RestoreService for RestoreServiceImpl {
    async fn restore(
        &self,
        directory: &dyn DirectoryService,
        cmd: RestoreCommand,
    ) -> SnapshotResult<RestoreOutcome> {
        let snapshot = self
            .snapshot_repo
            .get(&cmd.snapshot_id, cmd.passphrase.as_deref())
            .await
            .map_err(|e| match e {
                SnapshotException::InternalError { source } => {
                    SnapshotException::RestoreFailed { source }
                }
                e => e,
            })?;
        let destination = directory
            .profile()
            .await
            .map_err(|e| SnapshotException::RestoreFailed { source: e })?;
        tracing::info!(
            id = %snapshot.id,
            mode = %cmd.mode,
            destination = %destination.id,
            "Restoring snapshot."
        );

        let replay = Replay {
            directory,
            snapshot: &snapshot,
            destination: &destination,
            reason: format!("Snapshot restore: {}", snapshot.id),
        };
        let mut outcome = RestoreOutcome::default();
        let mut workspace_name = destination.name.to_owned();

        if cmd.mode.runs_identity() {
            let report = replay.identity().await;
            if report.failures().next().is_none() {
                workspace_name = snapshot.source_name.to_owned();
            }
            outcome.stages.push(report);
        }
        let mut role_map = RemapTable::new();
        if cmd.mode.runs_roles() {
            let (report, map) = replay.roles(&mut outcome).await;
            role_map = map;
            outcome.stages.push(report);
        }
        if cmd.mode.runs_channels() {
            outcome.stages.push(replay.channels(&role_map).await);
        }

        tracing::info!(
            id = %snapshot.id,
            failed = outcome.failed_attempts(),
            missing_members = outcome.missing_members.len(),
            "Snapshot restore finished."
        );
        let entry = HistoryEntry::restore(&snapshot.id, workspace_name, &cmd.actor, cmd.mode);
        if let Err(e) = self.history_repo.append(&entry).await {
            tracing::warn!(id = %snapshot.id, "Failed to record restore in history: {e:#}");
        }
        Ok(outcome)
    }
}
