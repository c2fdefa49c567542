use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, error, instrument};

use super::dto::Profile;
use crate::{error::AppError, state::AppState, store::CredentialStore};

/// Reads accounts for display. The stored hash is dropped here, before the
/// record leaves this component.
#[derive(Clone)]
pub struct ProfileReader {
    store: Arc<dyn CredentialStore>,
}

impl FromRef<AppState> for ProfileReader {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl ProfileReader {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::MissingField("userId is required"));
        }

        let user = self.store.get(user_id).await.map_err(|e| {
            error!(error = %e, user_id, "get user failed");
            AppError::internal("failed to load account", e)
        })?;

        match user {
            Some(user) => Ok(Profile::from(user)),
            None => {
                debug!(user_id, "user not found");
                Err(AppError::NotFound)
            }
        }
    }
}
