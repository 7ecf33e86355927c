//! Single-admin authentication.
//!
//! A correct password yields an HS256-signed bearer token carrying the admin
//! role. Nothing is stored server-side, so logout is left to the client.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const ADMIN_ROLE: &str = "admin";
const ADMIN_USER_ID: i32 = 1;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("token does not carry the admin role")]
    WrongRole,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub user_id: i32,
    pub role: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration (UTC Unix timestamp).
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub admin_password: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_password", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    /// Exchange the admin password for a token.
    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        let expected = self.config.admin_password.as_bytes();
        let matches = !expected.is_empty() && bool::from(password.as_bytes().ct_eq(expected));
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_at(OffsetDateTime::now_utc())
    }

    /// Sign an admin token as if issued at `issued_at`.
    pub fn issue_at(&self, issued_at: OffsetDateTime) -> Result<String, AuthError> {
        let expires_at = issued_at + self.config.token_ttl;
        let claims = AdminClaims {
            user_id: ADMIN_USER_ID,
            role: ADMIN_ROLE.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Check signature, expiry and role of a bearer token.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<AdminClaims>(token, &self.decoding, &validation)
            .map_err(AuthError::InvalidToken)?;
        if data.claims.role != ADMIN_ROLE {
            return Err(AuthError::WrongRole);
        }
        Ok(data.claims)
    }
}
