use thiserror::Error;

pub type SnapshotResult<T> = Result<T, SnapshotException>;

#[derive(Error, Debug)]
pub enum SnapshotException {
    #[error("There is no snapshot with id: {id}.")]
    NotFound { id: String },

    #[error("The snapshot is encrypted and no password was provided.")]
    PasswordRequired,

    #[error("The provided password can't decrypt the snapshot.")]
    WrongPassword,

    #[error("The snapshot content is corrupted: {reason}.")]
    Corrupt { reason: String },

    #[error("Capture failed: {source}")]
    CaptureFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("Restore failed: {source}")]
    RestoreFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("Snapshot internal error: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl SnapshotException {
    pub fn corrupt(reason: impl ToString) -> Self {
        SnapshotException::Corrupt {
            reason: reason.to_string(),
        }
    }

    /// Whether the error happened before anything was read from or written
    /// to a live workspace.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            SnapshotException::NotFound { .. }
                | SnapshotException::PasswordRequired
                | SnapshotException::WrongPassword
                | SnapshotException::Corrupt { .. }
        )
    }
}

impl From<anyhow::Error> for SnapshotException {
    fn from(e: anyhow::Error) -> Self {
        SnapshotException::InternalError { source: e }
    }
}
