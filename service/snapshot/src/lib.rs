mod capture;
mod codec;
mod recovery;
mod restore;

#[rustfmt::skip]
pub use {
    capture::CaptureServiceImpl,
    codec::SnapshotCodecServiceImpl,
    recovery::RoleRecoveryServiceImpl,
    restore::RestoreServiceImpl,
};
