use anyhow::Context;
use async_trait::async_trait;
use std::{io::ErrorKind, path::PathBuf};
use tokio::sync::Mutex;

use domain_snapshot::{model::entity::HistoryEntry, repository::HistoryRepo};

use super::write_atomic;

/// History kept as one JSON array file. The lock serializes the
/// read-modify-write of appends within this process only.
pub struct FileHistoryRepo {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHistoryRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(vec![]);
        }
        serde_json::from_slice(&bytes)
            .with_context(|| format!("History file {} is not valid", self.path.display()))
    }
}

#[async_trait]
impl HistoryRepo for FileHistoryRepo {
    async fn append(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.push(entry.clone());
        if let Some(parent) = self.path.parent().filter(|el| !el.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.path, &bytes).await
    }

    async fn list(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
