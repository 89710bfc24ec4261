mod history;
mod snapshot;

#[rustfmt::skip]
pub use {
    history::{HistoryEntry, HistoryKind},
    snapshot::{ChannelRecord, MemberRecord, RoleRecord, Snapshot},
};
