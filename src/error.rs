use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::policy::PasswordViolation;

/// Which uniqueness rule a registration collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    Email(String),
    Username(String),
    UserId(String),
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::Email(_) => f.write_str("Email already registered"),
            Conflict::Username(_) => f.write_str("Username already taken"),
            Conflict::UserId(_) => f.write_str("Account id already exists"),
        }
    }
}

/// Every failure a credential operation can report.
///
/// Client-input errors render their message directly. `Internal` renders only
/// its static context; the source is logged where the error is created.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidFormat(&'static str),

    #[error(transparent)]
    PolicyViolation(#[from] PasswordViolation),

    #[error("{0}")]
    Conflict(Conflict),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified. Please check your email for the verification link.")]
    NotVerified { user_id: String },

    #[error("User not found")]
    NotFound,

    #[error("Internal server error")]
    Internal {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn internal(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        AppError::Internal {
            context,
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::InvalidFormat(_)
            | AppError::PolicyViolation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotVerified { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::NotVerified { user_id } => json!({
                "error": self.to_string(),
                "userId": user_id,
            }),
            AppError::Internal { context, .. } => json!({
                "error": self.to_string(),
                "details": context,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
