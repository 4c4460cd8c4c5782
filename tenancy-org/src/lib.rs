//! # Tenancy Organization Models
//!
//! Domain types shared by every layer of the organization management
//! service.
//!
//! ## Overview
//!
//! The tenancy-org crate handles:
//! - **Organizations**: Tenant metadata kept in the master directory
//! - **Admins**: The single administrator account owning an organization
//! - **Changes**: Partial updates applied to an organization and its admin
//! - **Naming**: Deterministic tenant collection names
//!
//! ## Architecture
//!
//! ```text
//! Master directory (master_db)
//!   ├─ organization ─→ Organization ──┐
//!   └─ admin        ─→ Admin ←────────┘ (admin_id)
//!
//! Tenant database (orgs_db)
//!   └─ org_<normalized name>   (one collection per organization)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tenancy_org::{collection_name_for, Admin, Organization};
//!
//! let admin = Admin::new("admin@acme.test", "Acme Corp", "$2b$12$...");
//! let org = Organization::new("Acme Corp", &admin, collection_name_for("Acme Corp"), "orgs_db");
//!
//! assert_eq!(org.collection_name, "org_acme_corp");
//! assert_eq!(org.admin_id, admin.id);
//! ```

pub mod admin;
pub mod naming;
pub mod organization;

pub use admin::{normalize_email, Admin};
pub use naming::{collection_name_for, is_valid_collection_name, COLLECTION_PREFIX};
pub use organization::{normalize_name, Organization, OrganizationChanges, OrganizationSummary};
