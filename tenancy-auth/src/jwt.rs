//! JWT token generation and validation
//!
//! This module provides admin access tokens using the jsonwebtoken crate.
//! Tokens are signed with a shared secret using one of the HMAC algorithms
//! (HS256, HS384, HS512).

use crate::claims::AdminClaims;
use crate::error::{AuthError, AuthResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tenancy_org::Admin;
use uuid::Uuid;

/// JWT configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for HMAC signing
    pub secret: Option<String>,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Token issuer
    pub issuer: String,

    /// Access token duration
    pub access_token_duration: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: JwtAlgorithm::HS256,
            issuer: "tenancy".to_string(),
            access_token_duration: Duration::minutes(60),
        }
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl std::str::FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(JwtAlgorithm::HS256),
            "HS384" => Ok(JwtAlgorithm::HS384),
            "HS512" => Ok(JwtAlgorithm::HS512),
            other => Err(AuthError::ConfigError(format!(
                "Unsupported JWT algorithm: {other} (expected HS256, HS384 or HS512)"
            ))),
        }
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut config = self.config.clone();
        config.secret = config.secret.map(|_| "[REDACTED]".to_string());
        f.debug_struct("JwtService")
            .field("config", &config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration.
    ///
    /// # Errors
    ///
    /// `AuthError::ConfigError` if no secret (or an empty one) is configured,
    /// or if the token lifetime would push `exp` past the representable range.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        let secret = config
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::ConfigError("Secret required for HMAC".to_string()))?;

        if Utc::now()
            .checked_add_signed(config.access_token_duration)
            .is_none()
        {
            return Err(AuthError::ConfigError(
                "Access token duration out of range".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256, default issuer and lifetime).
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        let config = JwtConfig {
            secret: Some(secret.into()),
            ..Default::default()
        };
        Self::new(config)
    }

    /// Issue an access token for an admin.
    ///
    /// # Arguments
    ///
    /// * `admin_id` - The admin's unique identifier
    /// * `email` - The admin's email address
    /// * `organization_name` - The admin's organization
    pub fn issue(
        &self,
        admin_id: Uuid,
        email: impl Into<String>,
        organization_name: impl Into<String>,
    ) -> AuthResult<AccessToken> {
        let claims = AdminClaims::new(
            admin_id,
            email,
            organization_name,
            self.config.issuer.clone(),
            self.config.access_token_duration,
        );
        let token = self.encode_claims(&claims)?;
        Ok(AccessToken::bearer(token, self.config.access_token_duration.num_seconds()))
    }

    /// Issue an access token for a stored admin record.
    pub fn issue_for(&self, admin: &Admin) -> AuthResult<AccessToken> {
        self.issue(admin.id, admin.email.clone(), admin.organization_name.clone())
    }

    /// Encode existing claims into a signed token.
    pub fn encode_claims(&self, claims: &AdminClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Validate and decode a token.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenExpired` when the signature is good but `exp` has passed
    /// - `AuthError::InvalidToken` for anything else (bad signature, wrong
    ///   issuer or algorithm, malformed input)
    pub fn verify(&self, token: &str) -> AuthResult<AdminClaims> {
        let mut validation = Validation::new(self.config.algorithm.into());
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let token_data: TokenData<AdminClaims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidToken("Invalid algorithm".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

/// Access token returned on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Signed JWT
    pub access_token: String,

    /// Token type (always "bearer")
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,
}

impl AccessToken {
    /// Wrap a signed token as a bearer token.
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}
