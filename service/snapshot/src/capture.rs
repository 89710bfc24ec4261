use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashSet, sync::Arc};

use domain_snapshot::{
    command::CaptureCommand,
    exception::{SnapshotException, SnapshotResult},
    model::{
        entity::{ChannelRecord, HistoryEntry, MemberRecord, RoleRecord, Snapshot},
        vo::{ChannelKind, LiveChannel, LiveMember, LiveRole},
    },
    repository::{HistoryRepo, SnapshotRepo},
    service::{CaptureService, DirectoryService},
};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct CaptureServiceImpl {
    snapshot_repo: Arc<dyn SnapshotRepo>,
    history_repo: Arc<dyn HistoryRepo>,
    /// How many fresh ids to draw before giving up on a collision streak.
    #[builder(default = 8)]
    max_id_attempts: usize,
}

fn capture_failed(e: anyhow::Error) -> SnapshotException {
    SnapshotException::CaptureFailed { source: e }
}

fn role_record(role: LiveRole) -> RoleRecord {
    RoleRecord {
        source_id: role.id,
        name: role.name,
        color: RoleRecord::hex_color(role.color),
        is_pinned: role.hoist,
        position: role.position,
        permission_mask: role.permissions,
        is_mentionable: role.mentionable,
    }
}

fn channel_record(channel: LiveChannel) -> ChannelRecord {
    if channel.kind.is_category() {
        return ChannelRecord {
            source_id: channel.id,
            name: channel.name,
            kind: channel.kind,
            position: channel.position,
            parent_source_id: None,
            topic: None,
            nsfw_flag: false,
            slow_mode_seconds: 0,
            bitrate_hz: None,
            user_limit: None,
            overwrites: channel.overwrites,
        };
    }
    let is_voice = channel.kind == ChannelKind::Voice;
    ChannelRecord {
        source_id: channel.id,
        name: channel.name,
        kind: channel.kind,
        position: channel.position,
        parent_source_id: channel.parent_id,
        topic: channel.topic,
        nsfw_flag: channel.nsfw,
        slow_mode_seconds: channel.slow_mode_seconds,
        bitrate_hz: channel.bitrate.filter(|_| is_voice),
        user_limit: channel.user_limit.filter(|el| is_voice && *el > 0),
        overwrites: channel.overwrites,
    }
}

/// Orders channels categories first, then the rest, each ascending by
/// position. Ties keep the order the directory reported.
fn ordered_channels(channels: Vec<LiveChannel>) -> Vec<ChannelRecord> {
    let (mut categories, mut others): (Vec<_>, Vec<_>) =
        channels.into_iter().partition(|el| el.kind.is_category());
    categories.sort_by_key(|el| el.position);
    others.sort_by_key(|el| el.position);
    categories.into_iter().chain(others).map(channel_record).collect()
}

/// Drops parent references that don't point at a captured category, so a
/// stored snapshot never refers to a channel it doesn't contain.
fn detach_dangling_parents(snapshot: &mut Snapshot) {
    let dangling: HashSet<String> = snapshot
        .dangling_parents()
        .into_iter()
        .map(|el| el.source_id.to_owned())
        .collect();
    for record in snapshot
        .channels
        .iter_mut()
        .filter(|el| dangling.contains(&el.source_id))
    {
        tracing::warn!(
            channel = %record.source_id,
            parent = ?record.parent_source_id,
            "Parent is not a captured category, storing the channel without it."
        );
        record.parent_source_id = None;
    }
}

fn member_records(members: Vec<LiveMember>, everyone_ids: &HashSet<String>) -> Vec<MemberRecord> {
    members
        .into_iter()
        .filter(|el| !el.is_bot)
        .map(|el| MemberRecord {
            source_id: el.id,
            display_tag: el.tag,
            role_source_ids: el
                .role_ids
                .into_iter()
                .filter(|role| !everyone_ids.contains(role))
                .collect(),
        })
        .collect()
}

impl CaptureServiceImpl {
    async fn allocate_id(&self) -> anyhow::Result<String> {
        for _ in 0..self.max_id_attempts {
            let id = Snapshot::new_id();
            if !self.snapshot_repo.exists(&id).await? {
                return Ok(id);
            }
            tracing::debug!(%id, "Snapshot id already taken, drawing another.");
        }
        Err(anyhow!(
            "No free snapshot id after {} attempts",
            self.max_id_attempts
        ))
    }
}

#[async_trait]
impl CaptureService for CaptureServiceImpl {
    async fn capture(
        &self,
        directory: &dyn DirectoryService,
        cmd: CaptureCommand,
    ) -> SnapshotResult<String> {
        let id = self.allocate_id().await.map_err(capture_failed)?;

        let profile = directory.profile().await.map_err(capture_failed)?;
        let live_roles = directory.roles().await.map_err(capture_failed)?;
        let live_channels = directory.channels().await.map_err(capture_failed)?;
        let live_members = directory.members().await.map_err(capture_failed)?;

        let mut everyone_ids: HashSet<String> = live_roles
            .iter()
            .filter(|el| el.is_everyone)
            .map(|el| el.id.to_owned())
            .collect();
        everyone_ids.insert(profile.id.to_owned());

        let mut roles: Vec<_> = live_roles.into_iter().filter(|el| !el.is_everyone).collect();
        roles.sort_by_key(|el| std::cmp::Reverse(el.position));

        let mut snapshot = Snapshot {
            id,
            source_name: profile.name,
            source_icon_ref: profile.icon_ref,
            source_workspace_id: Some(profile.id),
            captured_at: Utc::now(),
            captured_by: cmd.actor.to_owned(),
            roles: roles.into_iter().map(role_record).collect(),
            channels: ordered_channels(live_channels),
            members: member_records(live_members, &everyone_ids),
        };
        detach_dangling_parents(&mut snapshot);

        let passphrase = cmd.passphrase.as_deref().filter(|el| !el.is_empty());
        let id = self
            .snapshot_repo
            .insert(&snapshot, passphrase)
            .await
            .map_err(capture_failed)?;
        tracing::info!(
            %id,
            workspace = %snapshot.source_name,
            roles = snapshot.roles.len(),
            channels = snapshot.channels.len(),
            members = snapshot.members.len(),
            encrypted = passphrase.is_some(),
            "Snapshot captured."
        );

        let entry = HistoryEntry::capture(
            &id,
            &snapshot.source_name,
            &cmd.actor,
            passphrase.is_some(),
        );
        if let Err(e) = self.history_repo.append(&entry).await {
            tracing::warn!(%id, "Failed to record capture in history: {e:#}");
        }
        Ok(id)
    }
}
