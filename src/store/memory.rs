use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, InsertOutcome, StoreError, UserFilter};
use crate::auth::repo_types::User;

/// In-process store. Scans are strongly consistent and inserts are atomic
/// under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn scan(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).cloned().collect())
    }

    async fn insert_if_absent(&self, user: &User) -> Result<InsertOutcome, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.user_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        users.insert(user.user_id.clone(), user.clone());
        Ok(InsertOutcome::Inserted)
    }
}
