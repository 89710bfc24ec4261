mod history;
mod member;
mod snapshot;

use crate::{cli::Command, infrastructure::ServiceProvider};

pub async fn run(provider: &ServiceProvider, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Capture { password } => snapshot::capture(provider, password).await,
        Command::Restore {
            id,
            mode,
            password,
            yes,
        } => snapshot::restore(provider, id, mode, password, yes).await,
        Command::List => snapshot::list(provider).await,
        Command::History => history::show(provider).await,
        Command::Export { id, path } => snapshot::export(provider, &id, &path).await,
        Command::RecoverMember { member_id } => member::recover(provider, &member_id).await,
    }
}
