//! Curated membership commands: add-member, remove-member

use crate::cli::error::CliResult;
use clap::Args;
use reserved_namespaces::NamespaceService;

/// A package registration and the namespace it is curated into
#[derive(Debug, Args)]
pub struct MemberArgs {
    /// Namespace prefix
    pub prefix: String,

    /// Package id of an existing registration
    pub package_id: String,
}

pub async fn execute_add_member(service: &NamespaceService, args: MemberArgs) -> CliResult<()> {
    service
        .lifecycle()
        .add_package_registration(&args.prefix, &args.package_id)?;
    service
        .lifecycle()
        .commit(service.config().default_commit_mode)
        .await?;
    println!("Added {} to {}", args.package_id, args.prefix);
    Ok(())
}

pub async fn execute_remove_member(service: &NamespaceService, args: MemberArgs) -> CliResult<()> {
    service
        .lifecycle()
        .remove_package_registration(&args.prefix, &args.package_id)?;
    service
        .lifecycle()
        .commit(service.config().default_commit_mode)
        .await?;
    println!("Removed {} from {}", args.package_id, args.prefix);
    Ok(())
}
