//! # Tenancy Store
//!
//! Storage for the organization management service.
//!
//! ## Overview
//!
//! The tenancy-store crate handles:
//! - **Master directory**: organization and admin records ([`DirectoryStore`])
//! - **Tenant collections**: one schemaless collection per organization
//!   ([`TenantCollections`])
//! - **Provisioning**: deterministic collection naming with collision
//!   checks ([`TenantProvisioner`])
//!
//! ## Features
//!
//! - `memory` (default): In-process store for single-node runs and testing
//! - `surreal`: SurrealDB-backed store (`ws://`, `mem://`, ...)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenancy_store::{MemoryStore, TenantProvisioner};
//!
//! async fn provision() {
//!     let store = Arc::new(MemoryStore::new());
//!     let provisioner = TenantProvisioner::new(store.clone());
//!
//!     let collection = provisioner.create_for("Acme Corp").await.unwrap();
//!     assert_eq!(collection, "org_acme_corp");
//! }
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provisioner;
pub mod store;

#[cfg(feature = "surreal")]
pub mod surreal;

// Re-export main types
pub use error::{StoreError, StoreResult};
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use provisioner::TenantProvisioner;
pub use store::{DirectoryStore, TenantCollections};

#[cfg(feature = "surreal")]
pub use surreal::{SurrealCollections, SurrealConfig, SurrealDirectory};
