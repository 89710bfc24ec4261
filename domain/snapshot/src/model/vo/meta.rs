use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name listed for a snapshot file that can't be read or parsed.
pub const CORRUPTED_SNAPSHOT_NAME: &str = "Corrupted Backup";
/// Name listed for an encrypted snapshot, whose content can't be peeked at.
pub const UNKNOWN_SNAPSHOT_NAME: &str = "Unknown";

/// Listing information for one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub id: String,
    pub name: String,
    /// File modification time.
    pub captured_at: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    pub is_encrypted: bool,
    pub is_corrupted: bool,
}

impl SnapshotMeta {
    pub fn corrupted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: CORRUPTED_SNAPSHOT_NAME.to_owned(),
            captured_at: DateTime::<Utc>::default(),
            size: 0,
            is_encrypted: false,
            is_corrupted: true,
        }
    }
}

/// Aggregate counts shown next to the history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total_snapshots: usize,
    pub captures: usize,
    pub restores: usize,
}
