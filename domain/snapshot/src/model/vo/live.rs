//! Entities as the live directory reports them and the requests used to create
//! new ones.

use super::{ChannelKind, PermissionMask, PermissionOverwrite};

/// Display metadata of a live workspace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceProfile {
    /// Workspace id. Also the id of its implicit "everyone" role.
    pub id: String,
    pub name: String,
    pub icon_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveRole {
    pub id: String,
    pub name: String,
    /// RGB color, 0 for none.
    pub color: u32,
    pub hoist: bool,
    pub position: i64,
    pub permissions: PermissionMask,
    pub mentionable: bool,
    /// Owned by an integration, can't be deleted or granted by hand.
    pub managed: bool,
    pub is_everyone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveChannel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub position: i64,
    pub parent_id: Option<String>,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub slow_mode_seconds: u32,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub overwrites: Vec<PermissionOverwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveMember {
    pub id: String,
    pub tag: String,
    pub is_bot: bool,
    pub role_ids: Vec<String>,
}

/// Role creation request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewRole {
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub permissions: PermissionMask,
    pub mentionable: bool,
    /// Requested position. Directories are free to ignore it and append.
    pub position: i64,
    pub reason: String,
}

/// Channel creation request. Kind-specific fields are `None` when they don't
/// apply to `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub position: i64,
    pub parent_id: Option<String>,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub slow_mode_seconds: Option<u32>,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub overwrites: Vec<PermissionOverwrite>,
    pub reason: String,
}
