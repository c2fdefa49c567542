use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::Profile, services::ProfileReader};
use crate::{error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

#[instrument(skip(reader))]
pub async fn get_user(
    State(reader): State<ProfileReader>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    reader.get_profile(&id).await.map(Json)
}
