//! Discord REST payloads, limited to the fields this tool reads or writes.

use domain_snapshot::model::vo::{
    ChannelKind, GranteeKind, LiveChannel, LiveMember, LiveRole, PermissionMask,
    PermissionOverwrite,
};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

pub const CDN_BASE: &str = "https://cdn.discordapp.com";

const GUILD_TEXT: u8 = 0;
const GUILD_VOICE: u8 = 2;
const GUILD_CATEGORY: u8 = 4;
const GUILD_ANNOUNCEMENT: u8 = 5;

pub fn kind_from_wire(value: u8) -> ChannelKind {
    match value {
        GUILD_TEXT => ChannelKind::Text,
        GUILD_VOICE => ChannelKind::Voice,
        GUILD_CATEGORY => ChannelKind::Category,
        GUILD_ANNOUNCEMENT => ChannelKind::Announcement,
        _ => ChannelKind::Unknown,
    }
}

pub fn kind_to_wire(kind: ChannelKind) -> u8 {
    match kind {
        ChannelKind::Voice => GUILD_VOICE,
        ChannelKind::Category => GUILD_CATEGORY,
        ChannelKind::Announcement => GUILD_ANNOUNCEMENT,
        ChannelKind::Text | ChannelKind::Unknown => GUILD_TEXT,
    }
}

fn parse_mask(value: &str) -> PermissionMask {
    PermissionMask(value.parse().unwrap_or_default())
}

#[derive(Deserialize, Debug)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
}

impl Guild {
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/icons/{}/{hash}.png", self.id))
    }
}

#[derive(Deserialize, Debug)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    pub position: i64,
    pub permissions: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    pub fn into_live(self, guild_id: &str) -> LiveRole {
        LiveRole {
            is_everyone: self.id == guild_id,
            permissions: parse_mask(&self.permissions),
            id: self.id,
            name: self.name,
            color: self.color,
            hoist: self.hoist,
            position: self.position,
            mentionable: self.mentionable,
            managed: self.managed,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Overwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub allow: String,
    pub deny: String,
}

impl Overwrite {
    fn into_live(self) -> Option<PermissionOverwrite> {
        Some(PermissionOverwrite {
            grantee_kind: GranteeKind::from_u8(self.kind)?,
            allow_mask: parse_mask(&self.allow),
            deny_mask: parse_mask(&self.deny),
            grantee_id: self.id,
        })
    }
}

impl From<&PermissionOverwrite> for Overwrite {
    fn from(value: &PermissionOverwrite) -> Self {
        Self {
            id: value.grantee_id.to_owned(),
            kind: value.grantee_kind as u8,
            allow: value.allow_mask.to_string(),
            deny: value.deny_mask.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub rate_limit_per_user: u32,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub permission_overwrites: Vec<Overwrite>,
}

impl From<Channel> for LiveChannel {
    fn from(value: Channel) -> Self {
        LiveChannel {
            id: value.id,
            name: value.name,
            kind: kind_from_wire(value.kind),
            position: value.position,
            parent_id: value.parent_id,
            topic: value.topic,
            nsfw: value.nsfw,
            slow_mode_seconds: value.rate_limit_per_user,
            bitrate: value.bitrate,
            user_limit: value.user_limit,
            overwrites: value
                .permission_overwrites
                .into_iter()
                .filter_map(Overwrite::into_live)
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// `name#1234` for legacy accounts, plain username otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(discriminator) if discriminator != "0" => {
                format!("{}#{discriminator}", self.username)
            }
            _ => self.username.to_owned(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<Member> for LiveMember {
    fn from(value: Member) -> Self {
        LiveMember {
            tag: value.user.tag(),
            is_bot: value.user.bot,
            id: value.user.id,
            role_ids: value.roles,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ModifyGuild {
    pub name: String,
    /// Data URI. Left out when `None`, which keeps the current icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CreateRole {
    pub name: String,
    pub permissions: String,
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
}

#[derive(Serialize, Debug)]
pub struct CreateChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub nsfw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    pub permission_overwrites: Vec<Overwrite>,
}

#[derive(Deserialize, Debug)]
pub struct Created {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct RateLimited {
    /// Seconds.
    pub retry_after: f64,
}
