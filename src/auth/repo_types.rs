use time::OffsetDateTime;

/// Prefix shared by every generated account id.
pub const USER_ID_PREFIX: &str = "user-";

/// Account record as held in the credential store. Deliberately not
/// `Serialize`: the public shape is [`crate::users::dto::Profile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: String,       // primary key, `user-<uuid>`
    pub email: String,         // normalized: trimmed and lowercased
    pub username: String,
    pub password_hash: String, // Argon2 PHC string
    pub verified: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn generate_id() -> String {
        format!("{USER_ID_PREFIX}{}", uuid::Uuid::new_v4())
    }
}
