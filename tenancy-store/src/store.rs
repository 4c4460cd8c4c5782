//! Store traits
//!
//! The lifecycle service only talks to storage through these two traits,
//! so the in-memory and SurrealDB backends are interchangeable.

use crate::error::StoreResult;
use async_trait::async_trait;
use tenancy_org::{Admin, Organization, OrganizationChanges};
use uuid::Uuid;

/// The master directory: organization metadata and admin records.
///
/// Organization names and admin emails are unique keys. Implementations
/// enforce uniqueness themselves so concurrent writers race at the storage
/// layer and the loser gets `StoreError::Duplicate`.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Persist a new organization together with its admin.
    ///
    /// Fails with `Duplicate` if the organization name or the admin email
    /// already exists. Either both records are written or neither is.
    async fn create_organization(&self, organization: Organization, admin: Admin) -> StoreResult<()>;

    /// Look up an organization by name.
    async fn find_organization(&self, name: &str) -> StoreResult<Organization>;

    /// Look up an admin by (normalized) email.
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Admin>;

    /// Look up an admin by ID.
    async fn find_admin(&self, admin_id: Uuid) -> StoreResult<Admin>;

    /// Apply a partial update to an organization and its admin.
    ///
    /// A rename also rewrites the admin's organization reference.
    ///
    /// Fails with `NotFound` if `current_name` is absent and with
    /// `Duplicate` if the new name or email belongs to a different record.
    async fn update_organization(
        &self,
        current_name: &str,
        changes: OrganizationChanges,
    ) -> StoreResult<Organization>;

    /// Remove an organization and its admin records.
    ///
    /// Returns the removed organization; `NotFound` if absent.
    async fn delete_organization(&self, name: &str) -> StoreResult<Organization>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

/// Tenant collections: one schemaless collection per organization.
#[async_trait]
pub trait TenantCollections: Send + Sync {
    /// Name of the database area holding tenant collections.
    fn tenant_database(&self) -> &str;

    /// Check whether a collection exists.
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool>;

    /// Create an empty collection; `Duplicate` if it already exists.
    async fn create_collection(&self, collection: &str) -> StoreResult<()>;

    /// Drop a collection and all its documents.
    ///
    /// Dropping a missing collection is a no-op.
    async fn drop_collection(&self, collection: &str) -> StoreResult<()>;

    /// Move every document from `from` into a new collection `to`, then
    /// drop `from`. `Duplicate` if `to` already exists.
    async fn rename_collection(&self, from: &str, to: &str) -> StoreResult<()>;

    /// Insert a document, returning its generated ID.
    ///
    /// `NotFound` if the collection does not exist.
    async fn insert_document(&self, collection: &str, document: serde_json::Value)
        -> StoreResult<String>;

    /// Delete a document by ID. Missing documents are ignored.
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Count the documents in a collection (0 for a missing collection).
    async fn count_documents(&self, collection: &str) -> StoreResult<u64>;
}
