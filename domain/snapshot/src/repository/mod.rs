mod history;
mod snapshot;

#[rustfmt::skip]
pub use {
    history::HistoryRepo,
    snapshot::SnapshotRepo,
};
