use anyhow::anyhow;
use colored::Colorize;

use domain_snapshot::service::DirectoryService;

use crate::infrastructure::ServiceProvider;

pub async fn recover(provider: &ServiceProvider, member_id: &str) -> anyhow::Result<()> {
    if !*provider.config.auto_role_recovery() {
        println!("{}", "Role recovery is disabled by configuration.".yellow());
        return Ok(());
    }
    let member = provider
        .directory
        .members()
        .await?
        .into_iter()
        .find(|el| el.id == member_id)
        .ok_or_else(|| anyhow!("Member {member_id} is not in the guild"))?;
    let granted = provider
        .recovery_service
        .recover(provider.directory.as_ref(), &member)
        .await?;
    if granted.is_empty() {
        println!("No roles to recover for {}.", member.tag.bold());
    } else {
        println!(
            "{} {} roles to {}",
            "Recovered".green().bold(),
            granted.len(),
            member.tag.bold()
        );
    }
    Ok(())
}
