use colored::Colorize;
use std::{path::Path, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};

use domain_snapshot::{
    command::{CaptureCommand, RestoreCommand},
    exception::SnapshotException,
    model::vo::{EntityOperation, RestoreMode, RestoreOutcome, RestoreStage},
};

use crate::infrastructure::ServiceProvider;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn capture(provider: &ServiceProvider, password: Option<String>) -> anyhow::Result<()> {
    let actor = provider.directory.current_user().await?;
    let encrypted = password.as_deref().is_some_and(|el| !el.is_empty());
    let id = provider
        .capture_service
        .capture(
            provider.directory.as_ref(),
            CaptureCommand {
                actor,
                passphrase: password,
            },
        )
        .await?;
    println!(
        "{} snapshot {}{}",
        "Captured".green().bold(),
        id.bold(),
        if encrypted { " (encrypted)" } else { "" }
    );
    Ok(())
}

pub async fn restore(
    provider: &ServiceProvider,
    id: String,
    mode: RestoreMode,
    password: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    if !yes && !confirm(&id, mode).await? {
        println!("{}", "Restore cancelled.".yellow());
        return Ok(());
    }
    let actor = provider.directory.current_user().await?;
    let outcome = provider
        .restore_service
        .restore(
            provider.directory.as_ref(),
            RestoreCommand {
                snapshot_id: id.to_owned(),
                actor,
                passphrase: password,
                mode,
            },
        )
        .await
        .map_err(|e| restore_error(&id, e))?;
    print_outcome(&id, mode, &outcome);
    Ok(())
}

fn restore_error(id: &str, e: SnapshotException) -> anyhow::Error {
    if e.is_pre_flight() {
        anyhow::Error::new(e).context(format!(
            "Snapshot {id} could not be loaded, the guild was not changed"
        ))
    } else {
        anyhow::Error::new(e)
    }
}

async fn confirm(id: &str, mode: RestoreMode) -> anyhow::Result<bool> {
    println!(
        "{} restoring {} in {mode} mode deletes existing roles and channels of the guild.",
        "Warning:".yellow().bold(),
        id.bold()
    );
    println!("Type `yes` within {} seconds to continue.", CONFIRM_TIMEOUT.as_secs());
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    match tokio::time::timeout(CONFIRM_TIMEOUT, stdin.read_line(&mut line)).await {
        Ok(read) => {
            read?;
            Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        }
        Err(_) => {
            println!("{}", "No answer, giving up.".yellow());
            Ok(false)
        }
    }
}

fn print_outcome(id: &str, mode: RestoreMode, outcome: &RestoreOutcome) {
    println!("{} snapshot {} ({mode})", "Restored".green().bold(), id.bold());
    let rows = [
        (RestoreStage::Identity, EntityOperation::SetIdentity, "identity"),
        (RestoreStage::Roles, EntityOperation::DeleteRole, "roles deleted"),
        (RestoreStage::Roles, EntityOperation::CreateRole, "roles created"),
        (RestoreStage::Roles, EntityOperation::GrantRoles, "members updated"),
        (RestoreStage::Channels, EntityOperation::DeleteChannel, "channels deleted"),
        (RestoreStage::Channels, EntityOperation::CreateCategory, "categories created"),
        (RestoreStage::Channels, EntityOperation::CreateChannel, "channels created"),
    ];
    for (stage, operation, label) in rows {
        if let Some(report) = outcome.stage(stage) {
            println!("  {label:<20} {}", report.succeeded(operation));
        }
    }
    let failed = outcome.failed_attempts();
    if failed > 0 {
        println!("{} {failed} operations failed:", "Warning:".yellow().bold());
        for attempt in outcome.stages.iter().flat_map(|el| el.failures()) {
            println!(
                "  {:?} {}: {}",
                attempt.operation,
                attempt.target,
                attempt.error.as_deref().unwrap_or_default()
            );
        }
    }
    if !outcome.missing_members.is_empty() {
        println!(
            "{} {} captured members are not in this guild: {}",
            "Note:".cyan().bold(),
            outcome.missing_members.len(),
            outcome.missing_members.join(", ")
        );
    }
}

pub async fn list(provider: &ServiceProvider) -> anyhow::Result<()> {
    let metas = provider.snapshot_repo.list().await?;
    if metas.is_empty() {
        println!("No snapshots stored in {}.", provider.config.snapshot_path().display());
        return Ok(());
    }
    for meta in metas {
        let name = if meta.is_corrupted {
            meta.name.red()
        } else {
            meta.name.normal()
        };
        println!(
            "{}  {}  {:>9} B  {}{}",
            meta.id.bold(),
            meta.captured_at.format("%Y-%m-%d %H:%M:%S"),
            meta.size,
            name,
            if meta.is_encrypted { " [encrypted]".yellow() } else { "".normal() }
        );
    }
    Ok(())
}

pub async fn export(provider: &ServiceProvider, id: &str, path: &Path) -> anyhow::Result<()> {
    let bytes = provider.snapshot_repo.read_raw(id).await?;
    tokio::fs::write(path, &bytes).await?;
    println!(
        "{} snapshot {} to {} ({} bytes)",
        "Exported".green().bold(),
        id.bold(),
        path.display(),
        bytes.len()
    );
    Ok(())
}
