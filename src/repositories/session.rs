use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{error::Result, models::session::Session};

/// Persistence contract for sessions.
///
/// There is deliberately no delete operation: sessions are only ever flipped
/// to invalid, so revoked logins stay around as an audit trail.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session for a user, recording the client's User-Agent when
    /// one was sent.
    async fn create(&self, user_id: Uuid, user_agent: Option<&str>) -> Result<Session>;

    /// Fetches a session by ID regardless of its validity flag. Callers
    /// decide how to treat an invalidated session.
    async fn get(&self, id: Uuid) -> Result<Option<Session>>;

    /// Lists a user's sessions that are still valid.
    async fn list_valid_for_user(&self, user_id: Uuid) -> Result<Vec<Session>>;

    /// Marks a single session invalid.
    async fn invalidate(&self, id: Uuid) -> Result<()>;

    /// Marks every valid session of a user invalid, returning how many were
    /// revoked.
    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64>;
}

/// Postgres-backed [`SessionStore`].
pub struct PgSessionStore {
    pool: Pool,
}

impl PgSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid, user_agent: Option<&str>) -> Result<Session> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO sessions (id, user_id, user_agent)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
                &[&Uuid::new_v4(), &user_id, &user_agent],
            )
            .await?;
        Ok(Session::from(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM sessions
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        Ok(row.map(|row| Session::from(&row)))
    }

    async fn list_valid_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT *
                FROM sessions
                WHERE user_id = $1 AND valid = true
                ORDER BY created_at DESC
                "#,
                &[&user_id],
            )
            .await?;
        Ok(rows.iter().map(Session::from).collect())
    }

    async fn invalidate(&self, id: Uuid) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                UPDATE sessions
                SET valid = false, updated_at = NOW()
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        Ok(())
    }

    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let client = self.pool.get().await?;
        let revoked = client
            .execute(
                r#"
                UPDATE sessions
                SET valid = false, updated_at = NOW()
                WHERE user_id = $1 AND valid = true
                "#,
                &[&user_id],
            )
            .await?;
        Ok(revoked)
    }
}
