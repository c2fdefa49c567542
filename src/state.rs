use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{dummy_hash, Argon2Hasher, CredentialHasher};
use crate::config::{AppConfig, StoreConfig};
use crate::store::{CredentialStore, DynamoStore, MemoryStore};

/// Process-wide handles, read-only once the server is up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CredentialStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        // Built once up front so the first unknown-email login pays no extra hash.
        tokio::task::spawn_blocking(|| dummy_hash().map(|_| ()))
            .await
            .context("placeholder hash task")??;

        let store: Arc<dyn CredentialStore> = match &config.store {
            StoreConfig::Memory => {
                info!("using in-memory credential store; accounts are lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreConfig::DynamoDb(dynamo) => Arc::new(
                DynamoStore::connect(dynamo)
                    .await
                    .context("connect to dynamodb")?,
            ),
        };
        Ok(Self::from_parts(Arc::new(config), store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn CredentialStore>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt.secret);
        Self {
            config,
            store,
            hasher: Arc::new(Argon2Hasher),
            tokens,
        }
    }
}
