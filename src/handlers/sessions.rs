use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    middleware_layer::auth::CurrentUser,
    models::session::Session,
    services::auth as auth_service,
    state::AppState,
};

/// The request payload for login. Carries the raw password, so no `Debug`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by logout: both token slots cleared, mirroring the login
/// payload shape so clients can blindly overwrite what they stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearedTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Handles login: validates credentials, opens a session, returns the token
/// pair.
#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let pair = auth_service::login(&state, &payload.email, &payload.password, user_agent).await?;

    Ok(Json(pair))
}

/// Lists the caller's valid sessions.
#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Session>>> {
    let sessions = auth_service::list_sessions(&state, user.user.id).await?;
    Ok(Json(sessions))
}

/// Handles logout: invalidates the session behind the caller's own tokens.
/// The session id comes from the verified token, never from the body, so a
/// caller cannot revoke anyone else's session.
#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse> {
    auth_service::revoke_session(&state, user.session_id).await?;

    Ok(Json(ClearedTokens {
        access_token: None,
        refresh_token: None,
    }))
}
