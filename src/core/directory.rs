//! User and organization directory collaborator

use crate::core::model::{User, Username};
use crate::core::service::ServiceError;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves accounts and the accounts a user may push on behalf of
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>, ServiceError>;

    /// Accounts `user` may push on behalf of, excluding `user` itself
    async fn delegates_of(&self, user: &Username) -> Result<BTreeSet<Username>, ServiceError> {
        Ok(self
            .find_user(user.as_str())
            .await?
            .map(|found| found.push_on_behalf_of)
            .unwrap_or_default())
    }
}

/// Directory backed by an in-process map
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<Username, User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.username.clone(), user);
    }

    /// Let `member` push on behalf of `organization`
    pub async fn add_delegation(
        &self,
        member: &Username,
        organization: Username,
    ) -> Result<(), ServiceError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(member)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("User '{}' not found", member)))?;
        user.push_on_behalf_of.insert(organization);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let username = Username::new(username)?;
        Ok(self.users.read().await.get(&username).cloned())
    }
}
