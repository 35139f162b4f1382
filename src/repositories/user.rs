use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Persistence contract for user records.
///
/// Abstracted behind a trait so the router can be exercised in tests with an
/// in-memory implementation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with [`AppError::Duplicate`] when the email
    /// is already registered.
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User>;

    /// Finds a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds a user by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Postgres-backed [`UserStore`].
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (id, email, name, password)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
                &[&Uuid::new_v4(), &email, &name, &password_hash],
            )
            .await
            .map_err(|e| {
                // The unique index on email resolves concurrent registrations
                // deterministically: exactly one insert wins.
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Duplicate("Email already in use".to_string())
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(User::from(&row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM users
                WHERE email = $1
                "#,
                &[&email],
            )
            .await?;
        Ok(row.map(|row| User::from(&row)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM users
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        Ok(row.map(|row| User::from(&row)))
    }
}
