#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Mutex,
};

use anyhow::{anyhow, bail};
use domain_snapshot::{
    exception::{SnapshotException, SnapshotResult},
    model::{
        entity::{HistoryEntry, Snapshot},
        vo::{
            ChannelKind, LiveChannel, LiveMember, LiveRole, NewChannel, NewRole, PermissionMask,
            SnapshotMeta, WorkspaceProfile, UNKNOWN_SNAPSHOT_NAME,
        },
    },
    repository::{HistoryRepo, SnapshotRepo},
    service::{DirectoryService, SnapshotCodecService},
};
use service_snapshot::SnapshotCodecServiceImpl;

pub const WORKSPACE_ID: &str = "900";

#[derive(Default)]
pub struct DirectoryState {
    pub profile: WorkspaceProfile,
    pub roles: Vec<LiveRole>,
    pub channels: Vec<LiveChannel>,
    pub members: Vec<LiveMember>,
    pub authority: i64,
    pub next_id: u64,
    /// Role or channel names whose creation fails.
    pub failing_names: HashSet<String>,
    pub fail_members: bool,
    /// Every `create_role` request in call order.
    pub created_roles: Vec<NewRole>,
    pub created_channels: Vec<NewChannel>,
    pub grants: Vec<(String, Vec<String>)>,
}

/// In-memory workspace that behaves like the remote directory: new roles go
/// right above "everyone" and push the others up.
pub struct FakeDirectory {
    pub state: Mutex<DirectoryState>,
}

impl FakeDirectory {
    pub fn empty() -> Self {
        let state = DirectoryState {
            profile: WorkspaceProfile {
                id: WORKSPACE_ID.into(),
                name: "Destination".into(),
                icon_ref: None,
            },
            roles: vec![LiveRole {
                id: WORKSPACE_ID.into(),
                name: "@everyone".into(),
                is_everyone: true,
                ..Default::default()
            }],
            authority: i64::MAX,
            next_id: 1000,
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with(edit: impl FnOnce(&mut DirectoryState)) -> Self {
        let directory = Self::empty();
        edit(&mut *directory.state.lock().unwrap());
        directory
    }

    pub fn fail_on(&self, name: &str) {
        self.state.lock().unwrap().failing_names.insert(name.into());
    }

    pub fn role_by_name(&self, name: &str) -> Option<LiveRole> {
        let state = self.state.lock().unwrap();
        state.roles.iter().find(|el| el.name == name).cloned()
    }

    pub fn channel_by_name(&self, name: &str) -> Option<LiveChannel> {
        let state = self.state.lock().unwrap();
        state.channels.iter().find(|el| el.name == name).cloned()
    }

    pub fn member(&self, id: &str) -> Option<LiveMember> {
        let state = self.state.lock().unwrap();
        state.members.iter().find(|el| el.id == id).cloned()
    }
}

impl DirectoryState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

pub fn role(id: &str, name: &str, position: i64) -> LiveRole {
    LiveRole {
        id: id.into(),
        name: name.into(),
        position,
        permissions: PermissionMask(8),
        ..Default::default()
    }
}

pub fn channel(
    id: &str,
    name: &str,
    kind: ChannelKind,
    position: i64,
    parent: Option<&str>,
) -> LiveChannel {
    LiveChannel {
        id: id.into(),
        name: name.into(),
        kind,
        position,
        parent_id: parent.map(Into::into),
        ..Default::default()
    }
}

pub fn member(id: &str, tag: &str, role_ids: &[&str]) -> LiveMember {
    LiveMember {
        id: id.into(),
        tag: tag.into(),
        is_bot: false,
        role_ids: role_ids.iter().map(|el| el.to_string()).collect(),
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn profile(&self) -> anyhow::Result<WorkspaceProfile> {
        Ok(self.state.lock().unwrap().profile.clone())
    }

    async fn roles(&self) -> anyhow::Result<Vec<LiveRole>> {
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn channels(&self) -> anyhow::Result<Vec<LiveChannel>> {
        Ok(self.state.lock().unwrap().channels.clone())
    }

    async fn members(&self) -> anyhow::Result<Vec<LiveMember>> {
        let state = self.state.lock().unwrap();
        if state.fail_members {
            bail!("member list unavailable");
        }
        Ok(state.members.clone())
    }

    async fn authority_position(&self) -> anyhow::Result<i64> {
        Ok(self.state.lock().unwrap().authority)
    }

    async fn set_identity(&self, name: &str, icon_ref: Option<String>) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.profile.name = name.into();
        if icon_ref.is_some() {
            state.profile.icon_ref = icon_ref;
        }
        Ok(())
    }

    async fn create_role(&self, role: NewRole) -> anyhow::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.created_roles.push(role.clone());
        if state.failing_names.contains(&role.name) {
            bail!("Missing permissions to create role {}", role.name);
        }
        for el in state.roles.iter_mut().filter(|el| !el.is_everyone) {
            el.position += 1;
        }
        let id = state.allocate_id();
        state.roles.push(LiveRole {
            id: id.to_owned(),
            name: role.name,
            color: role.color,
            hoist: role.hoist,
            position: 1,
            permissions: role.permissions,
            mentionable: role.mentionable,
            managed: false,
            is_everyone: false,
        });
        Ok(id)
    }

    async fn delete_role(&self, id: &str, _reason: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.roles.len();
        state.roles.retain(|el| el.id != id);
        if state.roles.len() == before {
            bail!("Unknown role {id}");
        }
        Ok(())
    }

    async fn create_channel(&self, channel: NewChannel) -> anyhow::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.created_channels.push(channel.clone());
        if state.failing_names.contains(&channel.name) {
            bail!("Missing permissions to create channel {}", channel.name);
        }
        if let Some(parent) = &channel.parent_id {
            let parent_is_category = state
                .channels
                .iter()
                .any(|el| &el.id == parent && el.kind.is_category());
            if !parent_is_category {
                bail!("Unknown parent channel {parent}");
            }
        }
        let id = state.allocate_id();
        state.channels.push(LiveChannel {
            id: id.to_owned(),
            name: channel.name,
            kind: channel.kind,
            position: channel.position,
            parent_id: channel.parent_id,
            topic: channel.topic,
            nsfw: channel.nsfw,
            slow_mode_seconds: channel.slow_mode_seconds.unwrap_or_default(),
            bitrate: channel.bitrate,
            user_limit: channel.user_limit,
            overwrites: channel.overwrites,
        });
        Ok(id)
    }

    async fn delete_channel(&self, id: &str, _reason: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.channels.retain(|el| el.id != id);
        Ok(())
    }

    async fn grant_roles(
        &self,
        member_id: &str,
        role_ids: &[String],
        _reason: &str,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.grants.push((member_id.into(), role_ids.to_vec()));
        let member = state
            .members
            .iter_mut()
            .find(|el| el.id == member_id)
            .ok_or(anyhow!("Unknown member {member_id}"))?;
        member.role_ids.extend(role_ids.iter().cloned());
        Ok(())
    }
}

/// Snapshot store keeping encoded bytes in memory. Later inserts list first.
pub struct MemorySnapshotRepo {
    codec: SnapshotCodecServiceImpl,
    files: Mutex<BTreeMap<String, (usize, Vec<u8>)>>,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
}

impl MemorySnapshotRepo {
    pub fn new() -> Self {
        Self {
            codec: SnapshotCodecServiceImpl::builder()
                .memory_cost_kib(64)
                .iterations(1)
                .build(),
            files: Mutex::new(BTreeMap::new()),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
        }
    }

    /// Makes `exists`, `get` and `read_raw` fail like a broken disk would.
    pub fn fail_reads(&self, reason: &str) {
        *self.read_failure.lock().unwrap() = Some(reason.into());
    }

    pub fn fail_writes(&self, reason: &str) {
        *self.write_failure.lock().unwrap() = Some(reason.into());
    }

    fn check(failure: &Mutex<Option<String>>) -> anyhow::Result<()> {
        match failure.lock().unwrap().as_deref() {
            Some(reason) => bail!("{reason}"),
            None => Ok(()),
        }
    }

    pub fn put_raw(&self, id: &str, bytes: &[u8]) {
        let mut files = self.files.lock().unwrap();
        let seq = files.len();
        files.insert(id.into(), (seq, bytes.to_vec()));
    }

    pub fn ids(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl SnapshotRepo for MemorySnapshotRepo {
    async fn insert(&self, snapshot: &Snapshot, passphrase: Option<&str>) -> anyhow::Result<String> {
        Self::check(&self.write_failure)?;
        let bytes = self.codec.encode(snapshot, passphrase)?;
        self.put_raw(&snapshot.id, &bytes);
        Ok(snapshot.id.to_owned())
    }

    async fn get(&self, id: &str, passphrase: Option<&str>) -> SnapshotResult<Snapshot> {
        let bytes = self.read_raw(id).await?;
        self.codec.decode(&bytes, passphrase)
    }

    async fn exists(&self, id: &str) -> anyhow::Result<bool> {
        Self::check(&self.read_failure)?;
        Ok(self.files.lock().unwrap().contains_key(id))
    }

    async fn read_raw(&self, id: &str) -> SnapshotResult<Vec<u8>> {
        Self::check(&self.read_failure)?;
        self.files
            .lock()
            .unwrap()
            .get(id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or(SnapshotException::NotFound { id: id.into() })
    }

    async fn list(&self) -> anyhow::Result<Vec<SnapshotMeta>> {
        let files = self.files.lock().unwrap();
        let mut entries: Vec<_> = files.iter().collect();
        entries.sort_by_key(|(_, (seq, _))| std::cmp::Reverse(*seq));
        Ok(entries
            .into_iter()
            .map(|(id, (_, bytes))| {
                if self.codec.is_encrypted(bytes) {
                    return SnapshotMeta {
                        id: id.to_owned(),
                        name: UNKNOWN_SNAPSHOT_NAME.into(),
                        captured_at: Utc::now(),
                        size: bytes.len() as u64,
                        is_encrypted: true,
                        is_corrupted: false,
                    };
                }
                match self.codec.decode(bytes, None) {
                    Ok(snapshot) => SnapshotMeta {
                        id: id.to_owned(),
                        name: snapshot.source_name,
                        captured_at: snapshot.captured_at,
                        size: bytes.len() as u64,
                        is_encrypted: false,
                        is_corrupted: false,
                    },
                    Err(_) => SnapshotMeta::corrupted(id),
                }
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryHistoryRepo {
    pub entries: Mutex<Vec<HistoryEntry>>,
}

#[async_trait]
impl HistoryRepo for MemoryHistoryRepo {
    async fn append(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.reverse();
        Ok(entries)
    }
}
