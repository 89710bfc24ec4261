use clap::{Parser, Subcommand};
use std::path::PathBuf;

use domain_snapshot::model::vo::RestoreMode;

/// Capture and restore Discord guild structure.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Extra yaml config files, applied after `config.yaml`
    #[arg(short, long = "config", global = true)]
    pub config: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snapshot the configured guild
    Capture {
        /// Encrypt the stored snapshot with this password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Replay a snapshot onto the configured guild
    Restore {
        id: String,

        /// full, rolesOnly, channelsOnly or basic
        #[arg(short, long, default_value_t = RestoreMode::Full)]
        mode: RestoreMode,

        /// Password of an encrypted snapshot
        #[arg(short, long)]
        password: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List stored snapshots, newest first
    List,

    /// Show recent captures and restores
    History,

    /// Copy a stored snapshot file as is
    Export { id: String, path: PathBuf },

    /// Give a member back the roles the newest snapshot knew them with
    RecoverMember { member_id: String },
}
