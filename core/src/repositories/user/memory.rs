//! In-memory implementation of UserDirectory

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::DomainError;

use super::trait_::UserDirectory;

#[derive(Debug, Clone)]
struct DirectoryEntry {
    email: String,
    roles: Vec<String>,
    active: bool,
}

/// In-memory user directory
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, DirectoryEntry>>>,
}

impl InMemoryUserDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an active user
    pub async fn upsert(&self, user_id: Uuid, email: impl Into<String>, roles: &[&str]) {
        let mut users = self.users.write().await;
        users.insert(
            user_id,
            DirectoryEntry {
                email: email.into(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
                active: true,
            },
        );
    }

    /// Replace the roles of an existing user
    pub async fn set_roles(&self, user_id: Uuid, roles: &[&str]) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(entry) => {
                entry.roles = roles.iter().map(|r| r.to_string()).collect();
                true
            }
            None => false,
        }
    }

    pub async fn deactivate(&self, user_id: Uuid) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, user_id: Uuid) -> bool {
        self.users.write().await.remove(&user_id).is_some()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve_roles(&self, user_id: Uuid) -> Result<Vec<String>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|u| u.roles.clone()).unwrap_or_default())
    }

    async fn resolve_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|u| u.email.clone()))
    }

    async fn is_active(&self, user_id: Uuid) -> Result<bool, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|u| u.active).unwrap_or(false))
    }
}
