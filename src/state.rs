use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    repositories::{
        product::{PgProductStore, ProductStore},
        session::{PgSessionStore, SessionStore},
        user::{PgUserStore, UserStore},
    },
    services::tokens::TokenService,
};

/// The application's state.
///
/// Everything in here is read-only after startup or internally synchronized
/// by the pool, so cloning per request shares the same `Arc`s and the
/// request path needs no locking.
#[derive(Clone)]
pub struct AppState {
    /// The user store.
    pub users: Arc<dyn UserStore>,
    /// The session store.
    pub sessions: Arc<dyn SessionStore>,
    /// The product store.
    pub products: Arc<dyn ProductStore>,
    /// The token signing/verification service.
    pub tokens: Arc<TokenService>,
    /// The application's configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates the production state: Postgres-backed stores over a shared
    /// pool. Fails fast when the database does not answer or the key
    /// material does not parse.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url)?;
        crate::db::ping(&pool).await?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let tokens =
            TokenService::new(config.jwt_private_key.as_str(), &config.jwt_public_key)?;
        tracing::info!("✅ Token service initialized (RS256)");

        Ok(Self::with_stores(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool.clone())),
            Arc::new(PgProductStore::new(pool)),
            tokens,
            config.clone(),
        ))
    }

    /// Assembles state from explicit parts. Integration tests use this to
    /// drive the real router over in-memory stores.
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        products: Arc<dyn ProductStore>,
        tokens: TokenService,
        config: Config,
    ) -> Self {
        Self {
            users,
            sessions,
            products,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }
}
