use crate::{exception::SnapshotResult, model::entity::Snapshot};

/// Turns snapshots into stored bytes and back.
///
/// Plaintext is the canonical JSON document. Anything whose first
/// non-whitespace byte isn't `{` is treated as ciphertext.
pub trait SnapshotCodecService: Send + Sync {
    fn encode(&self, snapshot: &Snapshot, passphrase: Option<&str>) -> SnapshotResult<Vec<u8>>;
    /// Fails with `PasswordRequired`, `WrongPassword` or `Corrupt`. A
    /// passphrase given for plaintext content is ignored.
    fn decode(&self, bytes: &[u8], passphrase: Option<&str>) -> SnapshotResult<Snapshot>;
    fn is_encrypted(&self, bytes: &[u8]) -> bool;
}
