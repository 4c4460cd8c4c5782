//! Admin domain model
//!
//! Each organization has exactly one admin account. The admin's email is
//! the login identity and is unique across the directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The administrator of one organization.
///
/// The password hash is kept on the record for verification but is never
/// serialized, so an `Admin` can be logged or returned without leaking it.
///
/// # Examples
///
/// ```
/// use tenancy_org::Admin;
///
/// let admin = Admin::new("owner@acme.test", "Acme Corp", "hash");
/// assert_eq!(admin.organization_name, "Acme Corp");
/// assert!(serde_json::to_string(&admin).unwrap().find("hash").is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Unique admin ID, embedded in issued tokens
    pub id: Uuid,

    /// Login email (normalized, unique)
    pub email: String,

    /// Organization this admin belongs to
    pub organization_name: String,

    /// bcrypt digest of the admin password
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// When the admin was created
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Creates a new admin with a fresh UUID v7 ID.
    pub fn new(
        email: impl Into<String>,
        organization_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            organization_name: organization_name.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Check whether this admin administers `organization_name`.
    pub fn belongs_to(&self, organization_name: &str) -> bool {
        self.organization_name == organization_name
    }
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("organization_name", &self.organization_name)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Normalize an email for storage and lookup.
///
/// Emails are trimmed and lowercased so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_creation() {
        let admin = Admin::new("owner@acme.test", "Acme Corp", "hash");

        assert_eq!(admin.email, "owner@acme.test");
        assert!(admin.belongs_to("Acme Corp"));
        assert!(!admin.belongs_to("Other Corp"));
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let admin = Admin::new("owner@acme.test", "Acme Corp", "$2b$12$secret");
        let json = serde_json::to_value(&admin).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(!format!("{:?}", admin).contains("secret"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Acme.TEST "), "admin@acme.test");
    }
}
