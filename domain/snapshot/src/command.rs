use crate::model::vo::{Actor, RestoreMode};

#[derive(Debug, Clone, Default)]
pub struct CaptureCommand {
    pub actor: Actor,
    /// Encrypt the stored snapshot with this passphrase.
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RestoreCommand {
    pub snapshot_id: String,
    pub actor: Actor,
    pub passphrase: Option<String>,
    pub mode: RestoreMode,
}
