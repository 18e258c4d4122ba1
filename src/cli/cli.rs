//! Main CLI application structure

use clap::Parser;
use reserved_namespaces::storage::JsonFileStore;
use reserved_namespaces::{NamespaceService, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cli::commands::{member, namespace, owner, query, user, Commands};
use crate::cli::error::{CliError, CliResult};

/// Snapshot file used when neither `--store` nor the config names one
pub const DEFAULT_STORE_FILE: &str = "namespaces.json";

/// nsadmin - administer reserved package-id namespaces
#[derive(Debug, Parser)]
#[command(name = "nsadmin")]
#[command(version = reserved_namespaces::VERSION)]
#[command(about = "nsadmin - administer reserved package-id namespaces")]
#[command(long_about = "nsadmin manages reserved namespaces stored in a JSON snapshot file.\n\n\
                         The snapshot file is resolved using this priority:\n\
                         1. --store <file>\n\
                         2. store_path from the --config TOML file\n\
                         3. namespaces.json in the current directory\n\n\
                         Examples:\n\
                           nsadmin add-namespace Contoso. --public\n\
                           nsadmin add-owner Contoso. alice\n\
                           nsadmin check Contoso.Tools bob --on-behalf")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON snapshot file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> CliResult<()> {
        reserved_namespaces::init_logging();

        let config = match &self.config {
            Some(path) => ServiceConfig::load_from_file(path).map_err(|e| {
                CliError::Config(format!("Failed to load {}: {}", path.display(), e))
            })?,
            None => ServiceConfig::default(),
        };

        let store_path = self
            .store
            .clone()
            .or_else(|| config.store_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
        if self.verbose {
            println!("Using snapshot file: {}", store_path.display());
        }
        debug!("Resolved snapshot file {}", store_path.display());

        let store = Arc::new(JsonFileStore::new(store_path));

        // User accounts live in the snapshot; no service needed
        let command = match self.command {
            Commands::AddUser(args) => return user::execute_add_user(&store, args).await,
            command => command,
        };

        let service = NamespaceService::new(config, store.clone(), store).await?;

        match command {
            Commands::AddNamespace(args) => namespace::execute_add_namespace(&service, args).await,
            Commands::DeleteNamespace(args) => {
                namespace::execute_delete_namespace(&service, args).await
            }
            Commands::List(args) => namespace::execute_list(&service, args),
            Commands::AddOwner(args) => owner::execute_add_owner(&service, args).await,
            Commands::RemoveOwner(args) => owner::execute_remove_owner(&service, args).await,
            Commands::AddMember(args) => member::execute_add_member(&service, args).await,
            Commands::RemoveMember(args) => member::execute_remove_member(&service, args).await,
            Commands::Matching(args) => query::execute_matching(&service, args),
            Commands::Check(args) => query::execute_check(&service, args).await,
            Commands::AddUser(_) => Ok(()),
        }
    }
}
