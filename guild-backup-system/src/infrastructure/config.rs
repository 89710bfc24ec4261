use getset::Getters;
use serde::*;
use std::path::PathBuf;

use super::telemetry::TelemetryConfig;

#[derive(Clone, Deserialize, Debug, Getters)]
#[getset(get = "pub")]
pub struct BackupConfig {
    #[serde(default = "BackupConfig::default_data_dir")]
    data_dir: PathBuf,
    /// Defaults to `<data_dir>/backups`.
    #[serde(default)]
    snapshot_dir: Option<PathBuf>,
    /// Defaults to `<data_dir>/backup-history.json`.
    #[serde(default)]
    history_file: Option<PathBuf>,
    #[serde(default = "BackupConfig::default_auto_role_recovery")]
    auto_role_recovery: bool,
    #[serde(default)]
    discord: DiscordConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            snapshot_dir: None,
            history_file: None,
            auto_role_recovery: Self::default_auto_role_recovery(),
            discord: Default::default(),
            telemetry: Default::default(),
        }
    }
}

impl BackupConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    fn default_auto_role_recovery() -> bool {
        true
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backup-history.json"))
    }
}

#[derive(Clone, Deserialize, Debug, Getters)]
#[getset(get = "pub")]
pub struct DiscordConfig {
    #[serde(default = "DiscordConfig::default_api_base")]
    api_base: String,
    /// Bot token, sent as `Authorization: Bot <token>`.
    #[serde(default)]
    token: String,
    /// The workspace this instance manages.
    #[serde(default)]
    guild_id: String,
    #[serde(default = "DiscordConfig::default_request_timeout_ms")]
    request_timeout_ms: u64,
    #[serde(default = "DiscordConfig::default_max_attempts")]
    max_attempts: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            token: Default::default(),
            guild_id: Default::default(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            max_attempts: Self::default_max_attempts(),
        }
    }
}

impl DiscordConfig {
    fn default_api_base() -> String {
        "https://discord.com/api/v10/".to_string()
    }
    fn default_request_timeout_ms() -> u64 {
        15_000
    }
    fn default_max_attempts() -> u64 {
        5
    }
}

/// Layers an optional `config.yaml`, the yaml `files` given on the command
/// line and `GUILD_BACKUP__*` environment variables, later sources winning.
pub fn build_config(files: &[PathBuf]) -> anyhow::Result<BackupConfig> {
    let mut config = config::Config::builder().add_source(
        config::File::with_name("config")
            .required(false)
            .format(config::FileFormat::Yaml),
    );
    for file in files {
        config = config.add_source(
            config::File::from(file.as_path())
                .format(config::FileFormat::Yaml)
                .required(true),
        );
    }
    config = config.add_source(
        config::Environment::with_prefix("GUILD_BACKUP")
            .separator("__")
            .try_parsing(true),
    );
    Ok(config.build()?.try_deserialize::<BackupConfig>()?)
}
