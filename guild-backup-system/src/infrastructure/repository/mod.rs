mod history;
mod snapshot;

use anyhow::Context;
use std::path::{Path, PathBuf};

#[rustfmt::skip]
pub use {
    history::FileHistoryRepo,
    snapshot::FileSnapshotRepo,
};

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` next to `path` and renames the result into place, so
/// readers see either the old content or the new one, never a torn file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let temp = temp_sibling(path);
    tokio::fs::write(&temp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", temp.display()))?;
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
