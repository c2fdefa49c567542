use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        services::{AuthenticationService, RegistrationService},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection, "rejected request body");
        AppError::InvalidFormat("Invalid JSON in request body")
    })
}

#[instrument(skip_all)]
pub async fn register(
    State(service): State<RegistrationService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let account = service.register(json_body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            account,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(service): State<AuthenticationService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = service.authenticate(json_body(payload)?).await?;
    Ok(Json(LoginResponse {
        message: "Login successful",
        session,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::{NewAccount, Session};

    #[test]
    fn register_response_is_flat_camel_case() {
        let body = RegisterResponse {
            message: "User registered successfully",
            account: NewAccount {
                user_id: "user-1".into(),
                email: "a@b.com".into(),
                username: "ab".into(),
                token: "t".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "User registered successfully");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["username"], "ab");
        assert_eq!(json["token"], "t");
    }

    #[test]
    fn login_response_omits_email() {
        let body = LoginResponse {
            message: "Login successful",
            session: Session {
                user_id: "user-1".into(),
                username: "ab".into(),
                token: "t".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["userId"], "user-1");
    }
}
