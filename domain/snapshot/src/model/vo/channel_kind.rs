use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of channel kinds a snapshot knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Container for other channels.
    Category,
    #[default]
    Text,
    Voice,
    Announcement,
    #[serde(other)]
    Unknown,
}

impl ChannelKind {
    pub fn is_category(&self) -> bool {
        matches!(self, ChannelKind::Category)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Category => "category",
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Announcement => "announcement",
            ChannelKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
