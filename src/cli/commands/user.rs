//! add-user command

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use reserved_namespaces::storage::JsonFileStore;
use reserved_namespaces::{User, Username};

/// Add or replace a user account
#[derive(Debug, Args)]
pub struct AddUserArgs {
    /// Username
    pub username: String,

    /// Accounts (e.g. organizations) this user may push on behalf of
    #[arg(long = "on-behalf-of", value_name = "ACCOUNT")]
    pub on_behalf_of: Vec<String>,
}

pub async fn execute_add_user(store: &JsonFileStore, args: AddUserArgs) -> CliResult<()> {
    let mut user = User::new(parse_username(&args.username)?);
    for account in &args.on_behalf_of {
        user = user.on_behalf_of(parse_username(account)?);
    }

    store.upsert_user(user).await?;
    println!("Saved user: {}", args.username);
    Ok(())
}

fn parse_username(value: &str) -> CliResult<Username> {
    Username::new(value).map_err(|_| CliError::Validation(format!("Invalid username: '{}'", value)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::expect_used)]
mod tests {
    use super::*;
    use reserved_namespaces::UserDirectory;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_execute_add_user_with_delegation() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("namespaces.json"));
        let args = AddUserArgs {
            username: "bob".to_string(),
            on_behalf_of: vec!["contoso".to_string()],
        };

        execute_add_user(&store, args).await.unwrap();

        let user = store.find_user("bob").await.unwrap().unwrap();
        assert!(user
            .push_on_behalf_of
            .contains(&Username::new("contoso").unwrap()));
    }

    #[tokio::test]
    async fn test_execute_add_user_empty_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("namespaces.json"));
        let args = AddUserArgs {
            username: String::new(),
            on_behalf_of: vec![],
        };
        assert!(matches!(
            execute_add_user(&store, args).await,
            Err(CliError::Validation(_))
        ));
    }
}
