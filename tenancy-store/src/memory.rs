//! In-memory store implementation.
//!
//! Suitable for single-process deployments and testing. Each operation
//! runs under one write lock, so uniqueness checks and writes are atomic.

use crate::error::{StoreError, StoreResult};
use crate::store::{DirectoryStore, TenantCollections};
use async_trait::async_trait;
use std::collections::HashMap;
use tenancy_org::{Admin, Organization, OrganizationChanges};
use tokio::sync::RwLock;
use uuid::Uuid;

type Documents = HashMap<String, serde_json::Value>;

#[derive(Debug, Default)]
struct Directory {
    /// Organizations keyed by name
    organizations: HashMap<String, Organization>,
    /// Admins keyed by ID
    admins: HashMap<Uuid, Admin>,
}

impl Directory {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.admins
            .values()
            .any(|a| a.email == email && Some(a.id) != except)
    }
}

/// In-memory master directory and tenant collections.
pub struct MemoryStore {
    directory: RwLock<Directory>,
    collections: RwLock<HashMap<String, Documents>>,
    tenant_database: String,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tenant_database", &self.tenant_database)
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store whose tenant area is named `orgs_db`.
    pub fn new() -> Self {
        Self::with_tenant_database("orgs_db")
    }

    /// Create an empty store with a custom tenant database name.
    pub fn with_tenant_database(name: impl Into<String>) -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            collections: RwLock::new(HashMap::new()),
            tenant_database: name.into(),
        }
    }

    /// Number of organizations in the directory.
    pub async fn organization_count(&self) -> usize {
        self.directory.read().await.organizations.len()
    }

    /// Number of admins in the directory.
    pub async fn admin_count(&self) -> usize {
        self.directory.read().await.admins.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn create_organization(&self, organization: Organization, admin: Admin) -> StoreResult<()> {
        let mut directory = self.directory.write().await;

        if directory
            .organizations
            .contains_key(&organization.organization_name)
        {
            return Err(StoreError::duplicate(
                "organization",
                organization.organization_name,
            ));
        }
        if directory.email_taken(&admin.email, None) {
            return Err(StoreError::duplicate("admin", admin.email));
        }

        directory.admins.insert(admin.id, admin);
        directory
            .organizations
            .insert(organization.organization_name.clone(), organization);
        Ok(())
    }

    async fn find_organization(&self, name: &str) -> StoreResult<Organization> {
        self.directory
            .read()
            .await
            .organizations
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization", name))
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Admin> {
        self.directory
            .read()
            .await
            .admins
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("admin", email))
    }

    async fn find_admin(&self, admin_id: Uuid) -> StoreResult<Admin> {
        self.directory
            .read()
            .await
            .admins
            .get(&admin_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("admin", admin_id.to_string()))
    }

    async fn update_organization(
        &self,
        current_name: &str,
        changes: OrganizationChanges,
    ) -> StoreResult<Organization> {
        let mut directory = self.directory.write().await;

        let mut organization = directory
            .organizations
            .get(current_name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization", current_name))?;

        if let Some(new_name) = &changes.organization_name {
            if new_name != current_name && directory.organizations.contains_key(new_name) {
                return Err(StoreError::duplicate("organization", new_name.clone()));
            }
        }
        if let Some(email) = &changes.admin_email {
            if directory.email_taken(email, Some(organization.admin_id)) {
                return Err(StoreError::duplicate("admin", email.clone()));
            }
        }

        organization.apply(&changes);

        for admin in directory.admins.values_mut() {
            let owner = admin.id == organization.admin_id;
            if !owner && admin.organization_name != current_name {
                continue;
            }
            admin.organization_name = organization.organization_name.clone();
            if owner {
                if let Some(email) = &changes.admin_email {
                    admin.email = email.clone();
                }
                if let Some(hash) = &changes.password_hash {
                    admin.password_hash = hash.clone();
                }
            }
        }

        directory.organizations.remove(current_name);
        directory
            .organizations
            .insert(organization.organization_name.clone(), organization.clone());

        Ok(organization)
    }

    async fn delete_organization(&self, name: &str) -> StoreResult<Organization> {
        let mut directory = self.directory.write().await;

        let organization = directory
            .organizations
            .remove(name)
            .ok_or_else(|| StoreError::not_found("organization", name))?;

        directory
            .admins
            .retain(|_, a| a.id != organization.admin_id && a.organization_name != name);

        Ok(organization)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TenantCollections for MemoryStore {
    fn tenant_database(&self) -> &str {
        &self.tenant_database
    }

    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(collection) {
            return Err(StoreError::duplicate("collection", collection));
        }
        collections.insert(collection.to_string(), Documents::new());
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn rename_collection(&self, from: &str, to: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(to) {
            return Err(StoreError::duplicate("collection", to));
        }
        let documents = collections.remove(from).unwrap_or_default();
        collections.insert(to.to_string(), documents);
        Ok(())
    }

    async fn insert_document(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> StoreResult<String> {
        let mut collections = self.collections.write().await;
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found("collection", collection))?;

        let id = Uuid::now_v7().to_string();
        documents.insert(id.clone(), document);
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(documents) = self.collections.write().await.get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<u64> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|d| d.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(name: &str, email: &str) -> (Organization, Admin) {
        let admin = Admin::new(email, name, "hash");
        let org = Organization::new(name, &admin, tenancy_org::collection_name_for(name), "orgs_db");
        (org, admin)
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let (org, admin) = records("Acme", "admin@acme.test");
        store.create_organization(org, admin).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = seeded().await;

        let org = store.find_organization("Acme").await.unwrap();
        assert_eq!(org.admin_email, "admin@acme.test");

        let admin = store.find_admin_by_email("admin@acme.test").await.unwrap();
        assert_eq!(admin.id, org.admin_id);
        assert_eq!(store.find_admin(admin.id).await.unwrap().email, admin.email);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let store = seeded().await;
        let (org, admin) = records("Acme", "other@acme.test");

        let result = store.create_organization(org, admin).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
        assert_eq!(store.admin_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = seeded().await;
        let (org, admin) = records("Other", "admin@acme.test");

        let result = store.create_organization(org, admin).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
        assert_eq!(store.organization_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_lookups() {
        let store = MemoryStore::new();

        assert!(store.find_organization("nope").await.unwrap_err().is_not_found());
        assert!(store.find_admin_by_email("x@y.z").await.unwrap_err().is_not_found());
        assert!(store.find_admin(Uuid::now_v7()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rename_moves_key_and_admin_reference() {
        let store = seeded().await;
        let changes = OrganizationChanges::default()
            .with_name("Acme Global", "org_acme_global")
            .with_email("boss@acme.test")
            .with_password_hash("new-hash");

        let org = store.update_organization("Acme", changes).await.unwrap();
        assert_eq!(org.organization_name, "Acme Global");
        assert_eq!(org.collection_name, "org_acme_global");
        assert_eq!(org.admin_email, "boss@acme.test");

        assert!(store.find_organization("Acme").await.is_err());
        let admin = store.find_admin(org.admin_id).await.unwrap();
        assert_eq!(admin.organization_name, "Acme Global");
        assert_eq!(admin.email, "boss@acme.test");
        assert_eq!(admin.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_update_collisions() {
        let store = seeded().await;
        let (org, admin) = records("Other", "other@acme.test");
        store.create_organization(org, admin).await.unwrap();

        let rename = OrganizationChanges::default().with_name("Other", "org_other");
        assert!(matches!(
            store.update_organization("Acme", rename).await,
            Err(StoreError::Duplicate { .. })
        ));

        let email = OrganizationChanges::default().with_email("other@acme.test");
        assert!(matches!(
            store.update_organization("Acme", email).await,
            Err(StoreError::Duplicate { .. })
        ));

        // Keeping one's own email is not a collision
        let same = OrganizationChanges::default().with_email("admin@acme.test");
        assert!(store.update_organization("Acme", same).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = MemoryStore::new();
        let result = store
            .update_organization("nope", OrganizationChanges::default())
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_admin() {
        let store = seeded().await;

        let removed = store.delete_organization("Acme").await.unwrap();
        assert_eq!(removed.organization_name, "Acme");
        assert_eq!(store.admin_count().await, 0);
        assert!(store.delete_organization("Acme").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_collections_lifecycle() {
        let store = MemoryStore::new();

        store.create_collection("org_acme").await.unwrap();
        assert!(store.collection_exists("org_acme").await.unwrap());
        assert!(matches!(
            store.create_collection("org_acme").await,
            Err(StoreError::Duplicate { .. })
        ));

        let id = store
            .insert_document("org_acme", serde_json::json!({"type": "init_doc"}))
            .await
            .unwrap();
        assert_eq!(store.count_documents("org_acme").await.unwrap(), 1);
        store.delete_document("org_acme", &id).await.unwrap();
        assert_eq!(store.count_documents("org_acme").await.unwrap(), 0);

        store.drop_collection("org_acme").await.unwrap();
        assert!(!store.collection_exists("org_acme").await.unwrap());
        assert!(store
            .insert_document("org_acme", serde_json::json!({}))
            .await
            .unwrap_err()
            .is_not_found());
        // Dropping again is a no-op
        store.drop_collection("org_acme").await.unwrap();
    }

    #[tokio::test]
    async fn test_rename_collection_moves_documents() {
        let store = MemoryStore::new();
        store.create_collection("org_a").await.unwrap();
        store
            .insert_document("org_a", serde_json::json!({"n": 1}))
            .await
            .unwrap();
        store
            .insert_document("org_a", serde_json::json!({"n": 2}))
            .await
            .unwrap();

        store.rename_collection("org_a", "org_b").await.unwrap();

        assert!(!store.collection_exists("org_a").await.unwrap());
        assert_eq!(store.count_documents("org_b").await.unwrap(), 2);

        store.create_collection("org_c").await.unwrap();
        assert!(matches!(
            store.rename_collection("org_b", "org_c").await,
            Err(StoreError::Duplicate { .. })
        ));
    }
}
