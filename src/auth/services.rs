use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, NewAccount, RegisterRequest, Session},
        jwt::TokenIssuer,
        password::{dummy_hash, CredentialHasher},
        policy,
        repo_types::User,
    },
    error::{AppError, Conflict},
    state::AppState,
    store::{CredentialStore, InsertOutcome, StoreError, UserFilter},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: Option<&str>) -> Option<String> {
    raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())
}

fn local_part(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

fn store_failure(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |e| {
        error!(error = %e, context, "credential store call failed");
        AppError::internal(context, e)
    }
}

async fn hash_blocking(
    hasher: &Arc<dyn CredentialHasher>,
    password: String,
) -> Result<String, AppError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| {
            error!(error = %e, "hashing task did not complete");
            AppError::internal("password hashing failed", e)
        })?
        .map_err(|e| {
            error!(error = %e, "hash_password failed");
            AppError::internal("password hashing failed", e)
        })
}

async fn verify_blocking(
    hasher: &Arc<dyn CredentialHasher>,
    password: String,
    hash: String,
) -> Result<bool, AppError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "verification task did not complete");
            AppError::internal("password verification failed", e)
        })?
        .map_err(|e| {
            error!(error = %e, "verify_password failed");
            AppError::internal("password verification failed", e)
        })
}

fn issue_token(tokens: &TokenIssuer, user: &User) -> Result<String, AppError> {
    tokens.issue(&user.user_id, &user.email).map_err(|e| {
        error!(error = %e, user_id = %user.user_id, "jwt sign failed");
        AppError::internal("failed to issue token", e)
    })
}

/// Creates accounts.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
    require_email_verification: bool,
}

impl FromRef<AppState> for RegistrationService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.hasher.clone(),
            state.tokens.clone(),
            state.config.require_email_verification,
        )
    }
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
        require_email_verification: bool,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            require_email_verification,
        }
    }

    /// Validates input, rejects duplicates, stores the hashed credentials and
    /// returns a token for the new account. Checks run in a fixed order and
    /// only the first failure is reported.
    ///
    /// The duplicate check and the insert are separate store calls, so
    /// concurrent registrations of one email are not prevented.
    #[instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest) -> Result<NewAccount, AppError> {
        let email = normalize_email(req.email.as_deref())
            .ok_or(AppError::MissingField("Email is required"))?;

        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::InvalidFormat("Invalid email format"));
        }

        if let Err(violation) = policy::validate(req.password.as_deref()) {
            warn!(email = %email, ?violation, "password rejected");
            return Err(violation.into());
        }
        let password = req.password.unwrap_or_default();

        // A chosen username must be unique. One derived from the email's local
        // part is not checked, so a@x.com and a@y.com can both register.
        let chosen = req
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_owned);
        let username_is_chosen = chosen.is_some();
        let username = chosen.unwrap_or_else(|| local_part(&email).to_owned());

        let filter = if username_is_chosen {
            UserFilter::EmailOrUsername {
                email: email.clone(),
                username: username.clone(),
            }
        } else {
            UserFilter::EmailEquals(email.clone())
        };
        let existing = self
            .store
            .scan(&filter)
            .await
            .map_err(store_failure("failed to check existing accounts"))?;

        if existing.iter().any(|u| u.email == email) {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(Conflict::Email(email)));
        }
        if username_is_chosen && existing.iter().any(|u| u.username == username) {
            warn!(username = %username, "username already taken");
            return Err(AppError::Conflict(Conflict::Username(username)));
        }

        let password_hash = hash_blocking(&self.hasher, password).await?;

        let now = OffsetDateTime::now_utc();
        let user = User {
            user_id: User::generate_id(),
            email,
            username,
            password_hash,
            verified: !self.require_email_verification,
            created_at: now,
            updated_at: now,
        };

        match self
            .store
            .insert_if_absent(&user)
            .await
            .map_err(store_failure("failed to create account"))?
        {
            InsertOutcome::Inserted => {}
            InsertOutcome::AlreadyExists => {
                warn!(user_id = %user.user_id, "generated user id already exists");
                return Err(AppError::Conflict(Conflict::UserId(user.user_id)));
            }
        }

        let token = issue_token(&self.tokens, &user)?;

        info!(user_id = %user.user_id, email = %user.email, "user registered");
        Ok(NewAccount {
            user_id: user.user_id,
            email: user.email,
            username: user.username,
            token,
        })
    }
}

/// Logs accounts in.
#[derive(Clone)]
pub struct AuthenticationService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
}

impl FromRef<AppState> for AuthenticationService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.hasher.clone(), state.tokens.clone())
    }
}

impl AuthenticationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Unknown email and wrong password both yield
    /// [`AppError::InvalidCredentials`], and both run one password
    /// verification. Only after the password matches can the caller learn
    /// that the account is unverified.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, req: LoginRequest) -> Result<Session, AppError> {
        let email = normalize_email(req.email.as_deref());
        let password = req.password.filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::MissingField("Email and password required"));
        };

        let mut candidates = self
            .store
            .scan(&UserFilter::EmailEquals(email.clone()))
            .await
            .map_err(store_failure("failed to look up account"))?;

        if candidates.len() > 1 {
            warn!(email = %email, count = candidates.len(), "multiple accounts share this email");
        }
        if candidates.is_empty() {
            let placeholder = dummy_hash().map_err(|e| {
                error!(error = %e, "placeholder hash unavailable");
                AppError::internal("password verification failed", e)
            })?;
            verify_blocking(&self.hasher, password, placeholder.to_owned()).await?;
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
        let user = candidates.swap_remove(0);

        if !verify_blocking(&self.hasher, password, user.password_hash.clone()).await? {
            warn!(email = %email, user_id = %user.user_id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.verified {
            warn!(user_id = %user.user_id, "login blocked, email not verified");
            return Err(AppError::NotVerified {
                user_id: user.user_id,
            });
        }

        let token = issue_token(&self.tokens, &user)?;

        info!(user_id = %user.user_id, email = %user.email, "user logged in");
        Ok(Session {
            user_id: user.user_id,
            username: user.username,
            token,
        })
    }
}
