use colored::Colorize;

use domain_snapshot::model::{
    entity::{HistoryEntry, HistoryKind},
    vo::{HistorySummary, SnapshotMeta},
};

use crate::infrastructure::ServiceProvider;

const RECENT_ENTRIES: usize = 25;

pub fn summarize(metas: &[SnapshotMeta], entries: &[HistoryEntry]) -> HistorySummary {
    HistorySummary {
        total_snapshots: metas.len(),
        captures: entries
            .iter()
            .filter(|el| el.kind == HistoryKind::Capture)
            .count(),
        restores: entries
            .iter()
            .filter(|el| el.kind == HistoryKind::Restore)
            .count(),
    }
}

pub async fn show(provider: &ServiceProvider) -> anyhow::Result<()> {
    let metas = provider.snapshot_repo.list().await?;
    let entries = provider.history_repo.list().await?;
    let summary = summarize(&metas, &entries);
    println!(
        "{} snapshots stored, {} captures, {} restores",
        summary.total_snapshots.to_string().bold(),
        summary.captures.to_string().bold(),
        summary.restores.to_string().bold()
    );
    for entry in entries.iter().take(RECENT_ENTRIES) {
        let kind = match entry.kind {
            HistoryKind::Capture => "capture".green(),
            HistoryKind::Restore => "restore".blue(),
        };
        let detail = match (entry.mode, entry.is_encrypted) {
            (Some(mode), _) => format!(" ({mode})"),
            (None, Some(true)) => " [encrypted]".to_string(),
            _ => String::new(),
        };
        println!(
            "{}  {:<7}  {}  {} by {}{detail}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            kind,
            entry.snapshot_id.bold(),
            entry.workspace_name,
            entry.user_tag
        );
    }
    Ok(())
}
