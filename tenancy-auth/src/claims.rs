//! JWT claims for admin access tokens
//!
//! A token names the admin (by email in `sub` and by ID in `admin_id`) and
//! the organization the admin belonged to when it was issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenancy_org::Admin;
use uuid::Uuid;

/// Claims carried by an admin access token.
///
/// # Example
///
/// ```rust
/// use tenancy_auth::claims::AdminClaims;
/// use uuid::Uuid;
///
/// let claims = AdminClaims::new(
///     Uuid::now_v7(),
///     "admin@acme.test",
///     "Acme Corp",
///     "tenancy",
///     chrono::Duration::minutes(60),
/// );
/// assert!(!claims.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    // Standard JWT claims (RFC 7519)
    /// Subject (admin email)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    // Service-specific claims
    /// Admin ID
    pub admin_id: Uuid,

    /// Organization the admin belonged to at issue time
    pub organization_name: String,
}

impl AdminClaims {
    /// Create new claims for an admin.
    ///
    /// # Arguments
    ///
    /// * `admin_id` - The admin's unique identifier
    /// * `email` - The admin's email address
    /// * `organization_name` - The admin's organization
    /// * `issuer` - Token issuer
    /// * `duration` - Token validity duration
    pub fn new(
        admin_id: Uuid,
        email: impl Into<String>,
        organization_name: impl Into<String>,
        issuer: impl Into<String>,
        duration: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            sub: email.into(),
            iss: issuer.into(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            admin_id,
            organization_name: organization_name.into(),
        }
    }

    /// Create claims from a stored admin record.
    pub fn for_admin(admin: &Admin, issuer: impl Into<String>, duration: chrono::Duration) -> Self {
        Self::new(
            admin.id,
            admin.email.clone(),
            admin.organization_name.clone(),
            issuer,
            duration,
        )
    }

    /// Admin email.
    pub fn email(&self) -> &str {
        &self.sub
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}
