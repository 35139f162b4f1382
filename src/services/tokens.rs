use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::UserPublic,
};

/// Clock-skew tolerance applied when checking `exp`, in seconds. Bounded so
/// that token expiry stays meaningful across instances.
const LEEWAY_SECS: u64 = 30;

/// Claims carried by an access token: the session it was minted for plus a
/// snapshot of the user at issuance time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The session ID the token is bound to.
    pub sub: Uuid,
    /// The user snapshot attached to the request context on verification.
    pub user: UserPublic,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Claims carried by a refresh token. Only the session reference: the user
/// is re-fetched at reissue time so profile changes propagate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// The session ID the token is bound to.
    pub sub: Uuid,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Classified verification failure. The middleware only refreshes on
/// `Expired`; everything else is rejected outright.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature and shape are fine but the token is past its expiry.
    #[error("token expired")]
    Expired,
    /// The signature does not verify against the configured public key.
    #[error("invalid token signature")]
    BadSignature,
    /// Not a parseable token of the expected shape.
    #[error("malformed token")]
    Malformed,
}

/// Signs and verifies the two token kinds with an RS256 key pair.
///
/// The private key signs, the public key verifies, so an instance holding
/// only the public key can validate tokens issued elsewhere. Key material is
/// parsed once at startup and is immutable afterwards.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Parses the PEM key pair. Failing here must abort startup: running
    /// without verifiable signatures is worse than not running.
    pub fn new(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid RSA private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid RSA public key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS;

        Ok(Self {
            encoding,
            decoding,
            validation,
        })
    }

    /// Mints an access token bound to `session_id`, embedding the user
    /// snapshot.
    pub fn sign_access(
        &self,
        user: &UserPublic,
        session_id: Uuid,
        ttl: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: session_id,
            user: user.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Access token signing failed: {e}")))
    }

    /// Mints a refresh token bound to `session_id`.
    pub fn sign_refresh(&self, session_id: Uuid, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: session_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Refresh token signing failed: {e}")))
    }

    /// Verifies an access token against the public key and its embedded
    /// expiry.
    pub fn verify_access(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    /// Verifies a refresh token against the public key and its embedded
    /// expiry.
    pub fn verify_refresh(&self, token: &str) -> std::result::Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/jwt_test_key.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/jwt_test_key.pub.pem");
    const OTHER_PRIVATE_PEM: &str = include_str!("../../tests/fixtures/jwt_other_key.pem");
    const OTHER_PUBLIC_PEM: &str = include_str!("../../tests/fixtures/jwt_other_key.pub.pem");

    fn service() -> TokenService {
        TokenService::new(PRIVATE_PEM, PUBLIC_PEM).unwrap()
    }

    fn snapshot() -> UserPublic {
        UserPublic {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let svc = service();
        let user = snapshot();
        let session_id = Uuid::new_v4();

        let token = svc
            .sign_access(&user, session_id, Duration::minutes(15))
            .unwrap();
        let claims = svc.verify_access(&token).unwrap();

        assert_eq!(claims.sub, session_id);
        assert_eq!(claims.user, user);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let svc = service();
        let session_id = Uuid::new_v4();

        let token = svc.sign_refresh(session_id, Duration::days(365)).unwrap();
        let claims = svc.verify_refresh(&token).unwrap();

        assert_eq!(claims.sub, session_id);
    }

    #[test]
    fn expired_access_token_is_classified_expired() {
        let svc = service();
        let token = svc
            .sign_access(&snapshot(), Uuid::new_v4(), Duration::seconds(-120))
            .unwrap();

        assert_eq!(svc.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expiry_within_leeway_still_verifies() {
        // Expired 10s ago, inside the 30s skew window.
        let svc = service();
        let token = svc
            .sign_access(&snapshot(), Uuid::new_v4(), Duration::seconds(-10))
            .unwrap();

        assert!(svc.verify_access(&token).is_ok());
    }

    #[test]
    fn token_from_foreign_key_is_rejected() {
        let svc = service();
        let foreign = TokenService::new(OTHER_PRIVATE_PEM, OTHER_PUBLIC_PEM).unwrap();

        let token = foreign
            .sign_access(&snapshot(), Uuid::new_v4(), Duration::minutes(15))
            .unwrap();

        assert_eq!(
            svc.verify_access(&token),
            Err(TokenError::BadSignature),
            "well-formed claims must not rescue a foreign signature"
        );
    }

    #[test]
    fn spliced_signature_is_rejected() {
        let svc = service();
        let a = svc
            .sign_access(&snapshot(), Uuid::new_v4(), Duration::minutes(15))
            .unwrap();
        let b = svc
            .sign_access(&snapshot(), Uuid::new_v4(), Duration::minutes(15))
            .unwrap();

        let a_parts: Vec<&str> = a.split('.').collect();
        let b_parts: Vec<&str> = b.split('.').collect();
        let spliced = format!("{}.{}.{}", a_parts[0], a_parts[1], b_parts[2]);

        assert_eq!(svc.verify_access(&spliced), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_classified_malformed() {
        let svc = service();
        assert_eq!(
            svc.verify_access("definitely.not.a-token"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn refresh_token_does_not_pass_as_access_token() {
        // A refresh token has no user claim, so the access decode fails on
        // shape rather than signature.
        let svc = service();
        let refresh = svc.sign_refresh(Uuid::new_v4(), Duration::days(365)).unwrap();

        assert_eq!(svc.verify_access(&refresh), Err(TokenError::Malformed));
    }
}
