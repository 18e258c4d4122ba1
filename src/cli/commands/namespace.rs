//! Namespace commands: add-namespace, delete-namespace, list

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use reserved_namespaces::{NamespacePrefix, NamespaceService, ReservedNamespace, Username};

/// Reserve a new namespace prefix
#[derive(Debug, Args)]
pub struct AddNamespaceArgs {
    /// Prefix to reserve (e.g. "Contoso.")
    pub prefix: String,

    /// Allow pushes from non-owners when shared pushes are enabled
    #[arg(long)]
    pub shared: bool,

    /// List the namespace publicly
    #[arg(long)]
    pub public: bool,

    /// Govern only the package id equal to the prefix
    #[arg(long)]
    pub exact: bool,

    /// Initial owners (repeatable)
    #[arg(long = "owner", value_name = "USER")]
    pub owners: Vec<String>,
}

/// Delete a reserved namespace
#[derive(Debug, Args)]
pub struct DeleteNamespaceArgs {
    /// Prefix of the namespace to delete
    pub prefix: String,
}

/// List reserved namespaces
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute_add_namespace(
    service: &NamespaceService,
    args: AddNamespaceArgs,
) -> CliResult<()> {
    let prefix = NamespacePrefix::new(args.prefix.as_str())
        .map_err(|_| CliError::Validation(format!("Invalid namespace prefix: '{}'", args.prefix)))?;

    let mut namespace = ReservedNamespace::new(prefix)
        .shared(args.shared)
        .public(args.public);
    if args.exact {
        namespace = namespace.exact();
    }
    for owner in &args.owners {
        let username = Username::new(owner.as_str())
            .map_err(|_| CliError::Validation(format!("Invalid username: '{}'", owner)))?;
        namespace = namespace.with_owner(username);
    }

    service.lifecycle().add_namespace(namespace).await?;
    println!("Reserved namespace: {}", args.prefix);
    Ok(())
}

pub async fn execute_delete_namespace(
    service: &NamespaceService,
    args: DeleteNamespaceArgs,
) -> CliResult<()> {
    service.lifecycle().delete_namespace(&args.prefix).await?;
    println!("Deleted namespace: {}", args.prefix);
    Ok(())
}

pub fn execute_list(service: &NamespaceService, args: ListArgs) -> CliResult<()> {
    let namespaces = service.list_namespaces()?;

    if args.json {
        let json = serde_json::to_string_pretty(&namespaces)
            .map_err(|e| CliError::Validation(format!("Failed to serialize namespaces: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if namespaces.is_empty() {
        println!("No reserved namespaces");
        return Ok(());
    }

    for namespace in &namespaces {
        println!("{}", describe(namespace));
    }
    Ok(())
}

/// One-line summary used by `list` and `matching`
pub(crate) fn describe(namespace: &ReservedNamespace) -> String {
    let mut flags = Vec::new();
    if !namespace.is_prefix {
        flags.push("exact");
    }
    if namespace.is_shared_namespace {
        flags.push("shared");
    }
    if namespace.is_public {
        flags.push("public");
    }

    let owners: Vec<&str> = namespace.owners.iter().map(|o| o.as_str()).collect();
    let owners = if owners.is_empty() {
        "-".to_string()
    } else {
        owners.join(", ")
    };

    if flags.is_empty() {
        format!("{}  owners: {}", namespace.prefix, owners)
    } else {
        format!("{} [{}]  owners: {}", namespace.prefix, flags.join(","), owners)
    }
}
