//! Tenant collection provisioning
//!
//! Derives each organization's collection name and creates, migrates or
//! drops the collection through a [`TenantCollections`] backend.

use crate::error::{StoreError, StoreResult};
use crate::store::TenantCollections;
use std::sync::Arc;
use tenancy_org::collection_name_for;
use tracing::{debug, error, info, warn};

/// Creates and destroys per-organization tenant collections.
#[derive(Clone)]
pub struct TenantProvisioner {
    collections: Arc<dyn TenantCollections>,
}

impl std::fmt::Debug for TenantProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantProvisioner")
            .field("tenant_database", &self.collections.tenant_database())
            .finish()
    }
}

impl TenantProvisioner {
    pub fn new(collections: Arc<dyn TenantCollections>) -> Self {
        Self { collections }
    }

    /// Name of the database area holding tenant collections.
    pub fn tenant_database(&self) -> &str {
        self.collections.tenant_database()
    }

    /// Collection name an organization would be provisioned under.
    pub fn collection_name_for(&self, organization_name: &str) -> String {
        collection_name_for(organization_name)
    }

    /// Fail with `Duplicate` if the collection for `organization_name`
    /// already exists.
    pub async fn ensure_available(&self, organization_name: &str) -> StoreResult<String> {
        let collection = collection_name_for(organization_name);
        if self.collections.collection_exists(&collection).await? {
            return Err(StoreError::duplicate("collection", collection));
        }
        Ok(collection)
    }

    /// Create the empty collection for `organization_name`.
    ///
    /// An init document is written and removed again to confirm the
    /// collection is reachable. If that fails the collection is dropped
    /// before the error is returned.
    pub async fn create_for(&self, organization_name: &str) -> StoreResult<String> {
        let collection = self.ensure_available(organization_name).await?;
        self.collections.create_collection(&collection).await?;

        if let Err(e) = self.write_init_document(&collection).await {
            warn!(error = %e, collection = %collection, "Tenant collection unusable, dropping it");
            if let Err(cleanup) = self.collections.drop_collection(&collection).await {
                error!(
                    error = %cleanup,
                    collection = %collection,
                    "Failed to drop partially provisioned tenant collection"
                );
            }
            return Err(e);
        }

        info!(
            collection = %collection,
            database = %self.tenant_database(),
            "Provisioned tenant collection"
        );
        Ok(collection)
    }

    async fn write_init_document(&self, collection: &str) -> StoreResult<()> {
        let init = serde_json::json!({
            "type": "init_doc",
            "created_at": chrono::Utc::now().to_rfc3339(),
        });
        let id = self.collections.insert_document(collection, init).await?;
        self.collections.delete_document(collection, &id).await
    }

    /// Drop the collection derived from `organization_name`.
    pub async fn drop_for(&self, organization_name: &str) -> StoreResult<()> {
        self.drop_named(&collection_name_for(organization_name)).await
    }

    /// Drop a collection by name. Missing collections are a no-op.
    pub async fn drop_named(&self, collection: &str) -> StoreResult<()> {
        self.collections.drop_collection(collection).await?;
        info!(collection = %collection, "Dropped tenant collection");
        Ok(())
    }

    /// Move `current_collection` to the collection derived from
    /// `new_organization_name`, returning the new name.
    ///
    /// When the derived name is unchanged nothing is moved.
    pub async fn rename(&self, current_collection: &str, new_organization_name: &str) -> StoreResult<String> {
        let target = collection_name_for(new_organization_name);
        if target == current_collection {
            debug!(collection = %target, "Tenant collection name unchanged");
            return Ok(target);
        }

        self.relocate(current_collection, &target).await?;
        Ok(target)
    }

    /// Move the documents of collection `from` into a new collection `to`
    /// and drop `from`.
    ///
    /// Used directly when undoing a rename, where the target is the
    /// recorded collection name rather than a derived one.
    pub async fn relocate(&self, from: &str, to: &str) -> StoreResult<()> {
        self.collections.rename_collection(from, to).await?;
        info!(from = %from, to = %to, "Migrated tenant collection");
        Ok(())
    }

    /// Number of documents in a tenant collection.
    pub async fn document_count(&self, collection: &str) -> StoreResult<u64> {
        self.collections.count_documents(collection).await
    }

    /// Check whether a tenant collection exists.
    pub async fn exists(&self, collection: &str) -> StoreResult<bool> {
        self.collections.collection_exists(collection).await
    }
}
