use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{
    config::Region, operation::scan::builders::ScanFluentBuilder, types::AttributeValue, Client,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};

use super::{CredentialStore, InsertOutcome, StoreError, UserFilter};
use crate::auth::repo_types::User;
use crate::config::DynamoConfig;

type Item = HashMap<String, AttributeValue>;

/// DynamoDB table keyed on `userId`.
///
/// Scans are eventually consistent, so a record written just before a scan
/// may not be returned by it.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub async fn connect(cfg: &DynamoConfig) -> anyhow::Result<Self> {
        let mut loader =
            defaults(BehaviorVersion::latest()).region(Region::new(cfg.region.clone()));
        if let Some(endpoint) = &cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some((access_key, secret_key)) = &cfg.static_credentials {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        }
        let shared = loader.load().await;

        info!(table = %cfg.table_name, region = %cfg.region, "dynamodb store configured");
        Ok(Self::from_client(Client::new(&shared), &cfg.table_name))
    }

    pub fn from_client(client: Client, table: &str) -> Self {
        Self {
            client,
            table: table.to_owned(),
        }
    }

    fn scan_request(&self, filter: &UserFilter) -> ScanFluentBuilder {
        let request = self.client.scan().table_name(&self.table);
        match filter {
            UserFilter::EmailEquals(email) => request
                .filter_expression("email = :email")
                .expression_attribute_values(":email", AttributeValue::S(email.clone())),
            UserFilter::EmailOrUsername { email, username } => request
                .filter_expression("email = :email OR username = :username")
                .expression_attribute_values(":email", AttributeValue::S(email.clone()))
                .expression_attribute_values(":username", AttributeValue::S(username.clone())),
        }
    }
}

#[async_trait]
impl CredentialStore for DynamoStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("userId", AttributeValue::S(user_id.to_owned()))
            .send()
            .await
            .map_err(StoreError::backend)?;
        out.item().map(decode_user).transpose()
    }

    async fn scan(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let mut found = Vec::new();
        let mut start_key: Option<Item> = None;
        let mut pages = 0u32;
        loop {
            let out = self
                .scan_request(filter)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(StoreError::backend)?;
            pages += 1;
            for item in out.items() {
                found.push(decode_user(item)?);
            }
            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        debug!(pages, matches = found.len(), "dynamodb scan finished");
        Ok(found)
    }

    async fn insert_if_absent(&self, user: &User) -> Result<InsertOutcome, StoreError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(encode_user(user)?))
            .condition_expression("attribute_not_exists(userId)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    Ok(InsertOutcome::AlreadyExists)
                } else {
                    Err(StoreError::backend(service_err))
                }
            }
        }
    }
}

fn encode_user(user: &User) -> Result<Item, StoreError> {
    let timestamp = |t: OffsetDateTime| {
        t.format(&Rfc3339).map_err(|e| StoreError::Corrupt {
            key: user.user_id.clone(),
            reason: e.to_string(),
        })
    };
    Ok(HashMap::from([
        ("userId".to_owned(), AttributeValue::S(user.user_id.clone())),
        ("email".to_owned(), AttributeValue::S(user.email.clone())),
        ("username".to_owned(), AttributeValue::S(user.username.clone())),
        ("passwordHash".to_owned(), AttributeValue::S(user.password_hash.clone())),
        ("verified".to_owned(), AttributeValue::Bool(user.verified)),
        ("createdAt".to_owned(), AttributeValue::S(timestamp(user.created_at)?)),
        ("updatedAt".to_owned(), AttributeValue::S(timestamp(user.updated_at)?)),
    ]))
}

fn decode_user(item: &Item) -> Result<User, StoreError> {
    let user_id = string_attr(item, "userId", "?")?;
    let key = user_id.as_str();
    let timestamp = |name: &str| {
        let raw = string_attr(item, name, key)?;
        OffsetDateTime::parse(&raw, &Rfc3339).map_err(|e| StoreError::Corrupt {
            key: key.to_owned(),
            reason: format!("{name}: {e}"),
        })
    };
    // Records written before the verification flag existed count as verified.
    let verified = match item.get("verified") {
        None => true,
        Some(AttributeValue::Bool(b)) => *b,
        Some(_) => {
            return Err(StoreError::Corrupt {
                key: key.to_owned(),
                reason: "verified is not a boolean".into(),
            })
        }
    };

    Ok(User {
        email: string_attr(item, "email", key)?,
        username: string_attr(item, "username", key)?,
        password_hash: string_attr(item, "passwordHash", key)?,
        verified,
        created_at: timestamp("createdAt")?,
        updated_at: timestamp("updatedAt")?,
        user_id,
    })
}

fn string_attr(item: &Item, name: &str, key: &str) -> Result<String, StoreError> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        _ => Err(StoreError::Corrupt {
            key: key.to_owned(),
            reason: format!("missing string attribute {name}"),
        }),
    }
}
