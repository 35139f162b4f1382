use std::env;

use anyhow::{Context, Result};
use chrono::Duration;
use zeroize::Zeroizing;

/// Accepted Argon2 memory-cost bounds, in MiB. The hasher converts MiB to
/// KiB in a `u32`, so the ceiling also keeps that multiplication in range.
const MIN_HASH_MEMORY_MIB: u32 = 8;
const MAX_HASH_MEMORY_MIB: u32 = 4096;

/// The application's configuration, read once at startup and immutable
/// afterwards.
#[derive(Clone)]
pub struct Config {
    /// The port the HTTP server listens on.
    pub port: u16,
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// Argon2id memory cost in MiB, the configurable password-hash work
    /// factor.
    pub hash_memory_mib: u32,
    /// Lifetime of access tokens.
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens.
    pub refresh_token_ttl: Duration,
    /// Whether a silent refresh also rotates the refresh token. Off by
    /// default to match the reuse-until-expiry design; switching it on kills
    /// a leaked refresh token at its next use.
    pub rotate_refresh_tokens: bool,
    /// The PEM-encoded RSA private key that signs tokens.
    pub jwt_private_key: Zeroizing<String>,
    /// The PEM-encoded RSA public key that verifies tokens.
    pub jwt_public_key: String,
    /// Exact origin allowed by CORS. Unset means permissive.
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Missing key material or an unusable database URL must fail here:
    /// refusing to start beats serving unsigned tokens.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "1337".to_string())
            .parse()
            .context("Invalid PORT")?;

        let hash_memory_mib = check_hash_memory(
            env::var("PASSWORD_HASH_MEMORY_MIB")
                .unwrap_or_else(|_| "19".to_string())
                .parse()
                .context("Invalid PASSWORD_HASH_MEMORY_MIB")?,
        )?;

        let access_minutes: i64 = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("Invalid ACCESS_TOKEN_TTL_MINUTES")?;
        if access_minutes <= 0 {
            anyhow::bail!("ACCESS_TOKEN_TTL_MINUTES must be positive");
        }

        let refresh_days: i64 = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "365".to_string())
            .parse()
            .context("Invalid REFRESH_TOKEN_TTL_DAYS")?;
        if refresh_days <= 0 {
            anyhow::bail!("REFRESH_TOKEN_TTL_DAYS must be positive");
        }

        Ok(Self {
            port,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            hash_memory_mib,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            rotate_refresh_tokens: env::var("ROTATE_REFRESH_TOKENS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid ROTATE_REFRESH_TOKENS (expected true or false)")?,
            jwt_private_key: Zeroizing::new(
                env::var("JWT_PRIVATE_KEY")
                    .context("JWT_PRIVATE_KEY must be set (PEM-encoded RSA private key)")?,
            ),
            jwt_public_key: env::var("JWT_PUBLIC_KEY")
                .context("JWT_PUBLIC_KEY must be set (PEM-encoded RSA public key)")?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
        })
    }
}

fn check_hash_memory(mib: u32) -> Result<u32> {
    if mib < MIN_HASH_MEMORY_MIB {
        anyhow::bail!("PASSWORD_HASH_MEMORY_MIB must be at least {MIN_HASH_MEMORY_MIB}");
    }
    if mib > MAX_HASH_MEMORY_MIB {
        anyhow::bail!("PASSWORD_HASH_MEMORY_MIB must be at most {MAX_HASH_MEMORY_MIB}");
    }
    Ok(mib)
}
