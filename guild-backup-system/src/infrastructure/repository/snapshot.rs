use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use typed_builder::TypedBuilder;

use super::write_atomic;

use domain_snapshot::{
    exception::{SnapshotException, SnapshotResult},
    model::{
        entity::Snapshot,
        vo::{SnapshotMeta, UNKNOWN_SNAPSHOT_NAME},
    },
    repository::SnapshotRepo,
    service::SnapshotCodecService,
};

const EXTENSION: &str = "json";

/// One `<id>.json` file per snapshot under `dir`.
#[derive(TypedBuilder)]
pub struct FileSnapshotRepo {
    #[builder(setter(into))]
    dir: PathBuf,
    codec: Arc<dyn SnapshotCodecService>,
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FileSnapshotRepo {
    fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn meta_of(&self, id: &str, path: &Path) -> anyhow::Result<SnapshotMeta> {
        let metadata = tokio::fs::metadata(path).await?;
        let captured_at: DateTime<Utc> = metadata.modified()?.into();
        let bytes = tokio::fs::read(path).await?;
        let name = if self.codec.is_encrypted(&bytes) {
            UNKNOWN_SNAPSHOT_NAME.to_owned()
        } else {
            self.codec.decode(&bytes, None)?.source_name
        };
        Ok(SnapshotMeta {
            id: id.to_owned(),
            name,
            captured_at,
            size: metadata.len(),
            is_encrypted: self.codec.is_encrypted(&bytes),
            is_corrupted: false,
        })
    }
}

#[async_trait]
impl SnapshotRepo for FileSnapshotRepo {
    async fn insert(&self, snapshot: &Snapshot, passphrase: Option<&str>) -> anyhow::Result<String> {
        if !is_valid_id(&snapshot.id) {
            anyhow::bail!("Invalid snapshot id: {:?}", snapshot.id);
        }
        let bytes = self.codec.encode(snapshot, passphrase)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_of(&snapshot.id);
        write_atomic(&path, &bytes).await?;
        Ok(snapshot.id.to_owned())
    }

    async fn get(&self, id: &str, passphrase: Option<&str>) -> SnapshotResult<Snapshot> {
        let bytes = self.read_raw(id).await?;
        self.codec.decode(&bytes, passphrase)
    }

    async fn exists(&self, id: &str) -> anyhow::Result<bool> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        Ok(tokio::fs::try_exists(self.path_of(id)).await?)
    }

    async fn read_raw(&self, id: &str) -> SnapshotResult<Vec<u8>> {
        if !is_valid_id(id) {
            return Err(SnapshotException::NotFound { id: id.to_owned() });
        }
        match tokio::fs::read(self.path_of(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SnapshotException::NotFound { id: id.to_owned() })
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to read snapshot {id}"))
                .into()),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<SnapshotMeta>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", self.dir.display()))
            }
        };
        let mut metas = vec![];
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|el| el.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|el| el.to_str()).map(str::to_owned) else {
                continue;
            };
            match self.meta_of(&id, &path).await {
                Ok(meta) => metas.push(meta),
                Err(e) => {
                    tracing::warn!(%id, "Listing snapshot as corrupted: {e:#}");
                    metas.push(SnapshotMeta::corrupted(id));
                }
            }
        }
        metas.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        Ok(metas)
    }
}
