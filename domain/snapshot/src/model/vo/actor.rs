use serde::{Deserialize, Serialize};

/// Identity of whoever initiated a capture or restore.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    /// Human readable tag, e.g. `name#0001`.
    pub tag: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}
