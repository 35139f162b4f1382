use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::{
    error::Result,
    models::user::UserPublic,
    services::auth as auth_service,
    state::AppState,
    validation::users::*,
};

/// The request payload for user registration.
///
/// No `Debug` on purpose: this struct carries the raw password and must
/// never end up in a log line.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt: {}", payload.email);
    validate_email(&payload.email)?;
    validate_name(&payload.name)?;
    validate_password(&payload.password)?;
    validate_password_confirmation(&payload.password, &payload.password_confirmation)?;

    let user =
        auth_service::register_user(&state, &payload.email, &payload.name, &payload.password)
            .await?;

    Ok(Json(UserPublic::from(&user)))
}
