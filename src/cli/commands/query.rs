//! Read-only commands: matching, check

use crate::cli::commands::namespace::describe;
use crate::cli::error::{CliError, CliResult};
use clap::Args;
use reserved_namespaces::{GrantSource, NamespaceService, PushDecision, Username};

/// Show reserved namespaces matching a package id
#[derive(Debug, Args)]
pub struct MatchingArgs {
    /// Package id to look up
    pub id: String,

    /// Only report a namespace whose prefix equals the id
    #[arg(long)]
    pub exact: bool,
}

/// Check whether a user may push a package id
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Package id being pushed
    pub id: String,

    /// Pushing user
    pub username: String,

    /// Also consider accounts the user pushes on behalf of
    #[arg(long)]
    pub on_behalf: bool,

    /// Output the decision as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_matching(service: &NamespaceService, args: MatchingArgs) -> CliResult<()> {
    let matches = service.find_all_matching(&args.id, args.exact)?;
    if matches.is_empty() {
        println!("No reserved namespace matches {}", args.id);
        return Ok(());
    }
    for namespace in &matches {
        println!("{}", describe(namespace));
    }
    Ok(())
}

/// Print the decision; a denied push is reported, not treated as a failure
pub async fn execute_check(service: &NamespaceService, args: CheckArgs) -> CliResult<()> {
    let user = Username::new(args.username.as_str())
        .map_err(|_| CliError::Validation(format!("Invalid username: '{}'", args.username)))?;

    let decision = if args.on_behalf {
        service
            .is_push_allowed_on_behalf_of_owners(&args.id, &user)
            .await?
    } else {
        service.is_push_allowed(&args.id, &user)?
    };

    if args.json {
        let json = serde_json::to_string_pretty(&decision)
            .map_err(|e| CliError::Validation(format!("Failed to serialize decision: {}", e)))?;
        println!("{}", json);
    } else {
        println!("{}", summarize(&args.id, &user, &decision));
    }
    Ok(())
}

fn summarize(id: &str, user: &Username, decision: &PushDecision) -> String {
    let verdict = if decision.allowed { "allowed" } else { "denied" };
    let reason = match &decision.grant {
        GrantSource::Unreserved => "no reserved namespace matches".to_string(),
        GrantSource::DirectOwner => "user owns a matching namespace".to_string(),
        GrantSource::OnBehalfOf(owners) => {
            let owners: Vec<&str> = owners.iter().map(|o| o.as_str()).collect();
            format!("pushing on behalf of {}", owners.join(", "))
        }
        GrantSource::SharedNamespace => "every matching namespace is shared".to_string(),
        GrantSource::Denied => "user owns no matching namespace".to_string(),
    };
    format!("{} push {} by {}: {}", verdict, id, user, reason)
}
