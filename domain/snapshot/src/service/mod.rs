mod capture;
mod codec;
mod directory;
mod recovery;
mod restore;

#[rustfmt::skip]
pub use {
    capture::CaptureService,
    codec::SnapshotCodecService,
    directory::DirectoryService,
    recovery::RoleRecoveryService,
    restore::RestoreService,
};
