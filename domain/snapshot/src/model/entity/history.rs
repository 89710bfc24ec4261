use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::vo::{Actor, RestoreMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryKind {
    #[serde(alias = "create")]
    Capture,
    #[serde(alias = "load")]
    Restore,
}

/// One line of the append-only operation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    #[serde(rename = "id")]
    pub snapshot_id: String,
    #[serde(rename = "name")]
    pub workspace_name: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_tag: String,
    /// Restore entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RestoreMode>,
    /// Capture entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_encrypted: Option<bool>,
}

impl HistoryEntry {
    pub fn capture(
        snapshot_id: impl Into<String>,
        workspace_name: impl Into<String>,
        actor: &Actor,
        is_encrypted: bool,
    ) -> Self {
        Self {
            kind: HistoryKind::Capture,
            snapshot_id: snapshot_id.into(),
            workspace_name: workspace_name.into(),
            timestamp: Utc::now(),
            user_id: actor.id.to_owned(),
            user_tag: actor.tag.to_owned(),
            mode: None,
            is_encrypted: Some(is_encrypted),
        }
    }

    pub fn restore(
        snapshot_id: impl Into<String>,
        workspace_name: impl Into<String>,
        actor: &Actor,
        mode: RestoreMode,
    ) -> Self {
        Self {
            kind: HistoryKind::Restore,
            snapshot_id: snapshot_id.into(),
            workspace_name: workspace_name.into(),
            timestamp: Utc::now(),
            user_id: actor.id.to_owned(),
            user_tag: actor.tag.to_owned(),
            mode: Some(mode),
            is_encrypted: None,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(&self.user_id, &self.user_tag)
    }
}
