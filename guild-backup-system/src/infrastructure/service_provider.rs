use anyhow::Context;
use reqwest::Url;
use std::{sync::Arc, time::Duration};

use domain_snapshot::{
    repository::{HistoryRepo, SnapshotRepo},
    service::{CaptureService, RestoreService, RoleRecoveryService, SnapshotCodecService},
};
use service_snapshot::{
    CaptureServiceImpl, RestoreServiceImpl, RoleRecoveryServiceImpl, SnapshotCodecServiceImpl,
};

use super::{
    config::BackupConfig,
    directory::DiscordDirectory,
    repository::{FileHistoryRepo, FileSnapshotRepo},
};

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/guild-backup-system, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Wires configuration, stores, the directory and the services together.
pub struct ServiceProvider {
    pub config: BackupConfig,
    pub directory: Arc<DiscordDirectory>,
    pub snapshot_repo: Arc<dyn SnapshotRepo>,
    pub history_repo: Arc<dyn HistoryRepo>,
    pub capture_service: Arc<dyn CaptureService>,
    pub restore_service: Arc<dyn RestoreService>,
    pub recovery_service: Arc<dyn RoleRecoveryService>,
}

impl ServiceProvider {
    pub fn build(config: BackupConfig) -> anyhow::Result<Self> {
        let discord = config.discord();
        if discord.token().is_empty() || discord.guild_id().is_empty() {
            anyhow::bail!(
                "discord.token and discord.guild_id must be set (GUILD_BACKUP__DISCORD__TOKEN, GUILD_BACKUP__DISCORD__GUILD_ID)"
            );
        }
        let mut api_base = discord.api_base().to_owned();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        let http_client = Arc::new(
            reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .connect_timeout(Duration::from_millis(*discord.request_timeout_ms()))
                .build()?,
        );
        let directory = Arc::new(
            DiscordDirectory::builder()
                .client(http_client)
                .api_base(Url::parse(&api_base).with_context(|| format!("Invalid api_base {api_base}"))?)
                .token(discord.token())
                .guild_id(discord.guild_id())
                .timeout_ms(*discord.request_timeout_ms())
                .max_attempts(*discord.max_attempts())
                .build(),
        );

        let codec: Arc<dyn SnapshotCodecService> = Arc::new(SnapshotCodecServiceImpl::default());
        let snapshot_repo: Arc<dyn SnapshotRepo> = Arc::new(
            FileSnapshotRepo::builder()
                .dir(config.snapshot_path())
                .codec(codec)
                .build(),
        );
        let history_repo: Arc<dyn HistoryRepo> =
            Arc::new(FileHistoryRepo::new(config.history_path()));

        Ok(Self {
            capture_service: Arc::new(
                CaptureServiceImpl::builder()
                    .snapshot_repo(snapshot_repo.clone())
                    .history_repo(history_repo.clone())
                    .build(),
            ),
            restore_service: Arc::new(
                RestoreServiceImpl::builder()
                    .snapshot_repo(snapshot_repo.clone())
                    .history_repo(history_repo.clone())
                    .build(),
            ),
            recovery_service: Arc::new(
                RoleRecoveryServiceImpl::builder()
                    .snapshot_repo(snapshot_repo.clone())
                    .build(),
            ),
            config,
            directory,
            snapshot_repo,
            history_repo,
        })
    }
}
