use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::vo::{Actor, ChannelKind, PermissionMask, PermissionOverwrite};

/// Point-in-time capture of a workspace's structure.
///
/// Every id in it is only meaningful inside the source workspace. Field names
/// on the wire are kept stable so older snapshot files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Short opaque id, also the file name of the stored snapshot.
    pub id: String,
    #[serde(rename = "name")]
    pub source_name: String,
    #[serde(rename = "icon", default)]
    pub source_icon_ref: Option<String>,
    /// Id of the source workspace, which is also the id of its "everyone" role.
    #[serde(rename = "guildId", default, skip_serializing_if = "Option::is_none")]
    pub source_workspace_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub captured_at: DateTime<Utc>,
    #[serde(rename = "createdBy")]
    pub captured_by: Actor,
    /// Highest position first. Never contains the "everyone" role.
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
    /// Categories first, then the rest, each ascending by position.
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
    #[serde(rename = "users", default)]
    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(rename = "id")]
    pub source_id: String,
    pub name: String,
    /// `#rrggbb`.
    pub color: String,
    /// Displayed separately from online members.
    #[serde(rename = "hoist")]
    pub is_pinned: bool,
    pub position: i64,
    #[serde(rename = "permissions")]
    pub permission_mask: PermissionMask,
    #[serde(rename = "mentionable")]
    pub is_mentionable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(rename = "id")]
    pub source_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub position: i64,
    /// Always `None` for categories.
    #[serde(rename = "parentId", default)]
    pub parent_source_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(rename = "nsfw", default)]
    pub nsfw_flag: bool,
    #[serde(rename = "rateLimitPerUser", default)]
    pub slow_mode_seconds: u32,
    /// Voice only.
    #[serde(rename = "bitrate", default)]
    pub bitrate_hz: Option<u32>,
    /// Voice only.
    #[serde(rename = "userLimit", default)]
    pub user_limit: Option<u32>,
    #[serde(rename = "permissionOverwrites", default)]
    pub overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "id")]
    pub source_id: String,
    #[serde(rename = "tag", default)]
    pub display_tag: String,
    #[serde(rename = "roles", default)]
    pub role_source_ids: BTreeSet<String>,
}

impl Snapshot {
    /// Draws a fresh 8 character id.
    pub fn new_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_owned()
    }

    pub fn categories(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.channels.iter().filter(|el| el.kind.is_category())
    }

    pub fn non_categories(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.channels.iter().filter(|el| !el.kind.is_category())
    }

    pub fn role(&self, source_id: &str) -> Option<&RoleRecord> {
        self.roles.iter().find(|el| el.source_id == source_id)
    }

    pub fn member(&self, source_id: &str) -> Option<&MemberRecord> {
        self.members.iter().find(|el| el.source_id == source_id)
    }

    /// Parent references that don't point at a category of this snapshot.
    pub fn dangling_parents(&self) -> Vec<&ChannelRecord> {
        let categories: HashSet<&str> =
            self.categories().map(|el| el.source_id.as_str()).collect();
        self.channels
            .iter()
            .filter(|el| {
                el.parent_source_id
                    .as_deref()
                    .is_some_and(|parent| !categories.contains(parent))
            })
            .collect()
    }
}

impl RoleRecord {
    pub fn hex_color(color: u32) -> String {
        format!("#{:06x}", color & 0x00ff_ffff)
    }

    /// Parses `color` back to RGB. Anything unparsable counts as no color.
    pub fn color_value(&self) -> u32 {
        u32::from_str_radix(self.color.trim_start_matches('#'), 16).unwrap_or_default()
    }
}

impl MemberRecord {
    /// Tag when known, id otherwise.
    pub fn label(&self) -> &str {
        if self.display_tag.is_empty() {
            &self.source_id
        } else {
            &self.display_tag
        }
    }
}
