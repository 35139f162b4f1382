use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderValue, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::UserPublic,
    services::{auth, tokens::TokenError},
    state::AppState,
};

/// Request header carrying the refresh token.
const REFRESH_HEADER: &str = "x-refresh";
/// Cookie consulted when the refresh header is absent.
const REFRESH_COOKIE: &str = "refresh_token";
/// Response header carrying a silently reissued access token.
const ACCESS_TOKEN_HEADER: &str = "x-access-token";
/// Response header carrying the replacement refresh token when rotation is
/// enabled.
const ROTATED_REFRESH_HEADER: &str = "x-refresh-token";

/// The authenticated identity attached to a request by [`deserialize_user`].
///
/// Doubles as an extractor: routes that require authentication take a
/// `CurrentUser` parameter and get a uniform 401 when the middleware
/// attached nothing. Routes without the parameter stay public.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The user snapshot decoded from the access token (or re-fetched on
    /// silent refresh).
    pub user: UserPublic,
    /// The session the presented tokens are bound to.
    pub session_id: Uuid,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }
}

/// Pulls the access token out of the `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Pulls the refresh token from the `x-refresh` header, falling back to the
/// `refresh_token` cookie.
fn refresh_token(request: &Request<Body>, cookies: &Cookies) -> Option<String> {
    if let Some(token) = request
        .headers()
        .get(REFRESH_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        return Some(token.to_string());
    }
    cookies
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Opportunistic authentication, applied to every route.
///
/// Attaches a [`CurrentUser`] when the request proves an identity and stays
/// silent otherwise; rejecting is the guard's job, not the middleware's. An
/// access token only counts once its session is confirmed valid, so a logout
/// takes effect immediately even for unexpired tokens. An expired (not
/// forged, not malformed) access token triggers one silent refresh attempt,
/// whose result is surfaced to the client via the `x-access-token` response
/// header. Store failures are the only errors that escape: those are 500s,
/// not a quiet downgrade to anonymous.
pub async fn deserialize_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let Some(access_token) = bearer_token(&request) else {
        return Ok(next.run(request).await);
    };

    match state.tokens.verify_access(&access_token) {
        Ok(claims) => {
            match state.sessions.get(claims.sub).await? {
                Some(session) if session.valid => {
                    request.extensions_mut().insert(CurrentUser {
                        user: claims.user,
                        session_id: claims.sub,
                    });
                }
                _ => {
                    tracing::debug!("❌ Access token references a revoked or unknown session");
                }
            }
            Ok(next.run(request).await)
        }

        Err(TokenError::Expired) => {
            let Some(refresh_token) = refresh_token(&request, &cookies) else {
                return Ok(next.run(request).await);
            };

            match auth::reissue_access_token(&state, &refresh_token).await? {
                Some(reissued) => {
                    request.extensions_mut().insert(CurrentUser {
                        user: reissued.user.clone(),
                        session_id: reissued.session_id,
                    });

                    let mut response = next.run(request).await;
                    if let Ok(value) = HeaderValue::from_str(&reissued.access_token) {
                        response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
                    }
                    if let Some(rotated) = reissued
                        .refresh_token
                        .as_deref()
                        .and_then(|token| HeaderValue::from_str(token).ok())
                    {
                        response.headers_mut().insert(ROTATED_REFRESH_HEADER, rotated);
                    }
                    Ok(response)
                }
                None => Ok(next.run(request).await),
            }
        }

        Err(_) => {
            // Forged or malformed. No refresh attempt: continue anonymous and
            // let the route guard decide whether that is fatal.
            tracing::debug!("❌ Unverifiable access token");
            Ok(next.run(request).await)
        }
    }
}
