use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::{
    error::{AppError, Result},
    models::{
        session::Session,
        user::{User, UserPublic},
    },
    state::AppState,
};

/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 4;

/// The generic credential failure message. Shared between "no such user"
/// and "wrong password" so responses cannot be used to enumerate accounts.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// The access/refresh pair returned by a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// The short-lived access token.
    pub access_token: String,
    /// The long-lived refresh token.
    pub refresh_token: String,
}

/// The outcome of a successful silent refresh.
#[derive(Debug, Clone)]
pub struct ReissuedAccess {
    /// The freshly minted access token.
    pub access_token: String,
    /// A replacement refresh token, present only when rotation is enabled.
    pub refresh_token: Option<String>,
    /// The re-fetched user snapshot.
    pub user: UserPublic,
    /// The session the new tokens are bound to.
    pub session_id: Uuid,
}

/// Hashes a password with Argon2id.
///
/// The memory cost is the configurable work factor; iteration count and
/// parallelism are fixed. The salt is drawn from the OS RNG and the PHC
/// string output embeds all parameters, so verification needs no config.
fn hash_password(password: &str, memory_mib: u32) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(memory_mib * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {e}")))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {e}")))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a stored PHC hash string.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Hash parse error: {e}")))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Emails are matched case-insensitively; stored lowercased and trimmed.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a new user. The raw password exists only long enough to hash.
pub async fn register_user(
    state: &AppState,
    email: &str,
    name: &str,
    password: &str,
) -> Result<User> {
    let email = normalize_email(email);
    let password_hash = hash_password(password, state.config.hash_memory_mib)?;

    let user = state.users.create(&email, name, &password_hash).await?;
    tracing::info!("✅ User registered: {}", user.id);
    Ok(user)
}

/// Validates credentials and opens a session, minting the token pair bound
/// to it. Fails with the generic credential error on unknown email or wrong
/// password.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    user_agent: Option<&str>,
) -> Result<TokenPair> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Login attempt: {}", email);

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    let session = state.sessions.create(user.id, user_agent).await?;

    let snapshot = UserPublic::from(&user);
    let pair = TokenPair {
        access_token: state.tokens.sign_access(
            &snapshot,
            session.id,
            state.config.access_token_ttl,
        )?,
        refresh_token: state
            .tokens
            .sign_refresh(session.id, state.config.refresh_token_ttl)?,
    };

    tracing::info!("✅ User authenticated: {} (session {})", user.id, session.id);
    Ok(pair)
}

/// Attempts to mint a fresh access token from a refresh token.
///
/// Returns `Ok(None)` for every "no" case (undecodable token, unknown or
/// invalidated session, vanished user) so the middleware can downgrade to an
/// unauthenticated request without leaking why. Store failures propagate.
///
/// The refresh token itself is reused unless rotation is enabled, in which
/// case the old session is retired and the pair moves to a replacement
/// session, killing the presented refresh token through the validity rule.
pub async fn reissue_access_token(
    state: &AppState,
    refresh_token: &str,
) -> Result<Option<ReissuedAccess>> {
    let claims = match state.tokens.verify_refresh(refresh_token) {
        Ok(claims) => claims,
        Err(_) => return Ok(None),
    };

    let session = match state.sessions.get(claims.sub).await? {
        Some(session) if session.valid => session,
        _ => return Ok(None),
    };

    let user = match state.users.find_by_id(session.user_id).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let (session_id, rotated_refresh) = if state.config.rotate_refresh_tokens {
        state.sessions.invalidate(session.id).await?;
        let replacement = state
            .sessions
            .create(session.user_id, session.user_agent.as_deref())
            .await?;
        let token = state
            .tokens
            .sign_refresh(replacement.id, state.config.refresh_token_ttl)?;
        tracing::debug!("🔄 Session rotated: {} -> {}", session.id, replacement.id);
        (replacement.id, Some(token))
    } else {
        (session.id, None)
    };

    let snapshot = UserPublic::from(&user);
    let access_token =
        state
            .tokens
            .sign_access(&snapshot, session_id, state.config.access_token_ttl)?;

    tracing::debug!("🔄 Access token reissued for session: {}", session_id);
    Ok(Some(ReissuedAccess {
        access_token,
        refresh_token: rotated_refresh,
        user: snapshot,
        session_id,
    }))
}

/// Lists the caller's sessions that are still valid.
pub async fn list_sessions(state: &AppState, user_id: Uuid) -> Result<Vec<Session>> {
    state.sessions.list_valid_for_user(user_id).await
}

/// Invalidates one session. Used by logout with the caller's own session id,
/// taken from the verified access token, never from client input.
pub async fn revoke_session(state: &AppState, session_id: Uuid) -> Result<()> {
    state.sessions.invalidate(session_id).await?;
    tracing::info!("🗑️ Session revoked: {}", session_id);
    Ok(())
}
