//! Owner commands: add-owner, remove-owner

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use reserved_namespaces::{CommitMode, NamespaceService};
use tracing::warn;

/// Add an owner to a namespace
#[derive(Debug, Args)]
pub struct AddOwnerArgs {
    /// Namespace prefix
    pub prefix: String,

    /// Username of the new owner
    pub username: String,
}

/// Remove owners from a namespace
#[derive(Debug, Args)]
pub struct RemoveOwnerArgs {
    /// Namespace prefix
    pub prefix: String,

    /// Usernames to remove
    #[arg(required = true)]
    pub usernames: Vec<String>,

    /// Commit every removal as its own transaction instead of one at the end
    #[arg(long)]
    pub commit_each: bool,
}

pub async fn execute_add_owner(service: &NamespaceService, args: AddOwnerArgs) -> CliResult<()> {
    service
        .lifecycle()
        .add_owner(&args.prefix, &args.username)
        .await?;
    println!("Added owner {} to {}", args.username, args.prefix);
    Ok(())
}

/// Remove owners, either committing each removal or all of them at once
///
/// In the deferred mode a failing removal discards everything already
/// removed in this invocation.
pub async fn execute_remove_owner(
    service: &NamespaceService,
    args: RemoveOwnerArgs,
) -> CliResult<()> {
    if args.usernames.is_empty() {
        return Err(CliError::Validation("No usernames provided".to_string()));
    }

    for username in &args.usernames {
        let removed = service
            .lifecycle()
            .delete_owner(&args.prefix, username, args.commit_each)
            .await;
        if let Err(e) = removed {
            if !args.commit_each && service.has_pending_changes()? {
                warn!("Discarding uncommitted owner removals from {}", args.prefix);
                service.reload().await?;
            }
            return Err(e.into());
        }
        if args.commit_each {
            println!("Removed owner {} from {}", username, args.prefix);
        }
    }

    if !args.commit_each {
        service.lifecycle().commit(CommitMode::Transaction).await?;
        println!(
            "Removed {} owner(s) from {}: {}",
            args.usernames.len(),
            args.prefix,
            args.usernames.join(", ")
        );
    }
    Ok(())
}
