use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// Represents one logical login.
///
/// The session id is the subject claim of both token kinds, which makes the
/// session the revocation unit: flipping `valid` to false kills every token
/// derived from it, expired or not. Sessions are never deleted, so revoked
/// logins remain visible as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The unique identifier for the session.
    pub id: Uuid,
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// Whether the session is still accepted for token verification.
    pub valid: bool,
    /// The User-Agent header captured at login, if the client sent one.
    pub user_agent: Option<String>,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Session {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            valid: row.get("valid"),
            user_agent: row.get("user_agent"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
