//! Organization domain models
//!
//! This module provides the Organization entity stored in the master
//! directory, plus the partial update applied to it. An organization is the
//! tenant: it owns exactly one admin and one tenant collection for as long
//! as it exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::Admin;

/// An organization registered in the master directory.
///
/// # Architecture
///
/// ```text
/// Organization
///   ├─ Admin (admin_id, admin_email)
///   └─ Tenant collection (tenant_database.collection_name)
/// ```
///
/// # Examples
///
/// ```
/// use tenancy_org::{Admin, Organization};
///
/// let admin = Admin::new("owner@acme.test", "Acme Corp", "hash");
/// let org = Organization::new("Acme Corp", &admin, "org_acme_corp", "orgs_db");
/// assert_eq!(org.organization_name, "Acme Corp");
/// assert_eq!(org.admin_email, "owner@acme.test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name, unique across the directory
    pub organization_name: String,

    /// The organization's admin
    pub admin_id: Uuid,

    /// Email of the organization's admin
    pub admin_email: String,

    /// Name of the tenant collection holding this organization's data
    pub collection_name: String,

    /// Database area the tenant collection lives in
    pub tenant_database: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization owned by `admin`.
    ///
    /// The organization is created with a newly generated UUID v7 ID and
    /// the current timestamp for created_at and updated_at.
    ///
    /// # Arguments
    ///
    /// * `organization_name` - The organization name (already normalized)
    /// * `admin` - The admin who owns this organization
    /// * `collection_name` - The provisioned tenant collection
    /// * `tenant_database` - The database holding tenant collections
    pub fn new(
        organization_name: impl Into<String>,
        admin: &Admin,
        collection_name: impl Into<String>,
        tenant_database: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            organization_name: organization_name.into(),
            admin_id: admin.id,
            admin_email: admin.email.clone(),
            collection_name: collection_name.into(),
            tenant_database: tenant_database.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a set of changes to this record.
    ///
    /// Only the organization-level fields are touched here; password
    /// changes belong to the admin record.
    pub fn apply(&mut self, changes: &OrganizationChanges) {
        if let Some(name) = &changes.organization_name {
            self.organization_name = name.clone();
        }
        if let Some(collection) = &changes.collection_name {
            self.collection_name = collection.clone();
        }
        if let Some(email) = &changes.admin_email {
            self.admin_email = email.clone();
        }
        self.updated_at = Utc::now();
    }

    /// Lightweight view for API responses.
    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary {
            name: self.organization_name.clone(),
            collection_name: self.collection_name.clone(),
            db_name: self.tenant_database.clone(),
        }
    }
}

/// Summary of an organization returned after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization name
    pub name: String,

    /// Tenant collection name
    pub collection_name: String,

    /// Tenant database name
    pub db_name: String,
}

/// Partial update of an organization and its admin.
///
/// `None` leaves a field untouched. An empty change set is valid and only
/// bumps `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationChanges {
    /// New organization name
    pub organization_name: Option<String>,

    /// New tenant collection name (follows a rename)
    pub collection_name: Option<String>,

    /// New admin email
    pub admin_email: Option<String>,

    /// New admin password hash
    pub password_hash: Option<String>,
}

impl OrganizationChanges {
    /// Rename the organization, moving it to a new tenant collection.
    pub fn with_name(mut self, name: impl Into<String>, collection: impl Into<String>) -> Self {
        self.organization_name = Some(name.into());
        self.collection_name = Some(collection.into());
        self
    }

    /// Change the admin email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    /// Change the admin password hash.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.organization_name.is_none()
            && self.collection_name.is_none()
            && self.admin_email.is_none()
            && self.password_hash.is_none()
    }
}

/// Normalize an organization name as it is stored and looked up.
///
/// Returns `None` for names that are empty after trimming.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Admin {
        Admin::new("owner@acme.test", "Acme Corp", "hash")
    }

    #[test]
    fn test_organization_creation() {
        let admin = admin();
        let org = Organization::new("Acme Corp", &admin, "org_acme_corp", "orgs_db");

        assert_eq!(org.organization_name, "Acme Corp");
        assert_eq!(org.admin_id, admin.id);
        assert_eq!(org.admin_email, "owner@acme.test");
        assert_eq!(org.collection_name, "org_acme_corp");
        assert_eq!(org.created_at, org.updated_at);
    }

    #[test]
    fn test_apply_changes() {
        let mut org = Organization::new("Acme Corp", &admin(), "org_acme_corp", "orgs_db");
        let changes = OrganizationChanges::default()
            .with_name("Acme Global", "org_acme_global")
            .with_email("new@acme.test")
            .with_password_hash("ignored-here");

        org.apply(&changes);

        assert_eq!(org.organization_name, "Acme Global");
        assert_eq!(org.collection_name, "org_acme_global");
        assert_eq!(org.admin_email, "new@acme.test");
        assert!(org.updated_at >= org.created_at);
    }

    #[test]
    fn test_empty_changes() {
        assert!(OrganizationChanges::default().is_empty());
        assert!(!OrganizationChanges::default().with_email("a@b.c").is_empty());
    }

    #[test]
    fn test_summary_shape() {
        let org = Organization::new("Acme Corp", &admin(), "org_acme_corp", "orgs_db");
        let json = serde_json::to_value(org.summary()).unwrap();

        assert_eq!(json["name"], "Acme Corp");
        assert_eq!(json["collection_name"], "org_acme_corp");
        assert_eq!(json["db_name"], "orgs_db");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Acme  "), Some("Acme".to_string()));
        assert_eq!(normalize_name("   "), None);
    }
}
