mod actor;
mod channel_kind;
mod live;
mod meta;
mod permission;
mod restore;

#[rustfmt::skip]
pub use {
    actor::Actor,
    channel_kind::ChannelKind,
    live::{LiveChannel, LiveMember, LiveRole, NewChannel, NewRole, WorkspaceProfile},
    meta::{HistorySummary, SnapshotMeta, CORRUPTED_SNAPSHOT_NAME, UNKNOWN_SNAPSHOT_NAME},
    permission::{GranteeKind, PermissionMask, PermissionOverwrite},
    restore::{EntityAttempt, EntityOperation, RestoreMode, RestoreOutcome, RestoreStage, StageReport},
};
