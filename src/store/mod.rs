//! Credential store contract and its adapters.
//!
//! The store offers per-key atomicity only. Uniqueness of `email` and
//! `username` is checked with [`CredentialStore::scan`] before the insert, so
//! two concurrent registrations of the same email can both succeed. Adapters
//! backed by an eventually consistent scan may also miss a record written a
//! moment earlier.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::repo_types::User;

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

/// Predicate for [`CredentialStore::scan`].
///
/// Kept as data rather than a closure so that remote adapters can turn it
/// into a server-side filter or an index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    EmailEquals(String),
    EmailOrUsername { email: String, username: String },
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::EmailEquals(email) => user.email == *email,
            UserFilter::EmailOrUsername { email, username } => {
                user.email == *email || user.username == *username
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("malformed record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Backend(err.into())
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Point lookup by `userId`.
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Linear scan returning every record matching `filter`.
    async fn scan(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;

    /// Writes `user` only if no record exists under its `userId`.
    async fn insert_if_absent(&self, user: &User) -> Result<InsertOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(email: &str, username: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            user_id: User::generate_id(),
            email: email.into(),
            username: username.into(),
            password_hash: "x".into(),
            verified: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn email_filter_matches_exact_email_only() {
        let f = UserFilter::EmailEquals("a@b.com".into());
        assert!(f.matches(&user("a@b.com", "ab")));
        assert!(!f.matches(&user("aa@b.com", "a@b.com")));
    }

    #[test]
    fn email_or_username_filter_matches_either() {
        let f = UserFilter::EmailOrUsername {
            email: "a@b.com".into(),
            username: "ab".into(),
        };
        assert!(f.matches(&user("a@b.com", "zz")));
        assert!(f.matches(&user("z@b.com", "ab")));
        assert!(!f.matches(&user("z@b.com", "zz")));
    }
}
