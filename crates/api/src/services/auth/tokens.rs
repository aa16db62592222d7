//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying `sub` (user ID), `iat`, `exp` and `iss`.
//! Verification checks the signature, the expiry and the issuer.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use abacus_core::UserId;

use super::AuthError;
use crate::config::JwtConfig;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

/// A signed access token as returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    /// The encoded JWT.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: TimeDelta,
}

impl TokenService {
    /// Build a token service from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            ttl: config.token_ttl,
        }
    }

    /// Issue a token for `user`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: UserId) -> Result<AccessToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for `user` as if it had been issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_at(
        &self,
        user: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let claims = Claims {
            sub: user.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenEncoding)?;

        Ok(AccessToken {
            access_token,
            token_type: "bearer",
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Resolve the user a bearer token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for an expired token and
    /// `AuthError::InvalidToken` for anything else that fails verification.
    pub fn resolve_identity(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "Rejected bearer token");
                    AuthError::InvalidToken
                }
            }
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)
    }
}
