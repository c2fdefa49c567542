use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::repo_types::User;

/// Public view of an account. Has no password hash field at all, so a
/// profile can never leak one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        let User {
            user_id,
            email,
            username,
            password_hash: _,
            verified,
            created_at,
            updated_at,
        } = user;
        Self {
            user_id,
            email,
            username,
            verified,
            created_at,
            updated_at,
        }
    }
}
