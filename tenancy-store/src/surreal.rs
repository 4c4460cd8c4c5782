//! SurrealDB-backed store for multi-node deployments.
//!
//! The master directory lives in one SurrealDB database (`master_db` by
//! default) and tenant collections are tables in a second database
//! (`orgs_db`). Both share a namespace and may share a server.
//!
//! UUIDs are record keys stored as strings. Timestamps are stored as
//! RFC 3339 strings.

use crate::error::{StoreError, StoreResult};
use crate::store::{DirectoryStore, TenantCollections};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Response, Surreal};
use tenancy_org::{is_valid_collection_name, Admin, Organization, OrganizationChanges};
use tracing::{debug, info};
use uuid::Uuid;

const DIRECTORY_SCHEMA: &str = "\
DEFINE TABLE IF NOT EXISTS organization SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_organization_name ON TABLE organization \
    COLUMNS organization_name UNIQUE;
DEFINE TABLE IF NOT EXISTS admin SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_admin_email ON TABLE admin COLUMNS email UNIQUE;
";

const TENANT_SCHEMA: &str = "\
DEFINE TABLE IF NOT EXISTS tenant_collection SCHEMALESS;
";

const ORGANIZATION_FIELDS: &str = "meta::id(id) AS record_id, organization_name, admin_id, \
    admin_email, collection_name, tenant_database, created_at, updated_at";

const ADMIN_FIELDS: &str =
    "meta::id(id) AS record_id, email, organization_name, password_hash, created_at";

/// Connection settings shared by the directory and tenant databases.
#[derive(Debug, Clone)]
pub struct SurrealConfig {
    /// Endpoint URL (e.g., `ws://127.0.0.1:8000`, `mem://`)
    pub url: String,
    /// SurrealDB namespace
    pub namespace: String,
    /// Database holding organizations and admins
    pub directory_database: String,
    /// Database holding tenant collections
    pub tenant_database: String,
    /// Root username, if the server requires authentication
    pub username: Option<String>,
    /// Root password
    pub password: Option<String>,
}

impl Default for SurrealConfig {
    fn default() -> Self {
        Self {
            url: "mem://".into(),
            namespace: "tenancy".into(),
            directory_database: "master_db".into(),
            tenant_database: "orgs_db".into(),
            username: None,
            password: None,
        }
    }
}

impl SurrealConfig {
    async fn open(&self, database: &str) -> StoreResult<Surreal<Any>> {
        info!(
            url = %self.url,
            namespace = %self.namespace,
            database = %database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(self.url.as_str()).await?;

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }

        db.use_ns(self.namespace.as_str()).use_db(database).await?;
        Ok(db)
    }
}

/// Collect every statement error in a response.
///
/// Unique index violations become `Duplicate`; anything else is a backend
/// failure. Inside a transaction the statement that actually failed is not
/// necessarily the first one reporting an error, so all are inspected.
fn check(mut response: Response, entity: &str, key: &str) -> StoreResult<Response> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }

    let messages: Vec<String> = errors.into_values().map(|e| e.to_string()).collect();
    if messages
        .iter()
        .any(|m| m.contains("already contains") || m.contains("already exists"))
    {
        return Err(StoreError::duplicate(entity, key));
    }
    Err(StoreError::Backend(messages.join("; ")))
}

fn parse_uuid(value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::Backend(format!("invalid UUID {value}: {e}")))
}

#[derive(Debug, Deserialize)]
struct OrganizationRow {
    record_id: String,
    organization_name: String,
    admin_id: String,
    admin_email: String,
    collection_name: String,
    tenant_database: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn try_into_organization(self) -> StoreResult<Organization> {
        Ok(Organization {
            id: parse_uuid(&self.record_id)?,
            organization_name: self.organization_name,
            admin_id: parse_uuid(&self.admin_id)?,
            admin_email: self.admin_email,
            collection_name: self.collection_name,
            tenant_database: self.tenant_database,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AdminRow {
    record_id: String,
    email: String,
    organization_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl AdminRow {
    fn try_into_admin(self) -> StoreResult<Admin> {
        Ok(Admin {
            id: parse_uuid(&self.record_id)?,
            email: self.email,
            organization_name: self.organization_name,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct CollectionRow {
    #[allow(dead_code)]
    record_id: String,
}

/// SurrealDB master directory.
#[derive(Clone)]
pub struct SurrealDirectory<C: Connection = Any> {
    db: Surreal<C>,
}

impl SurrealDirectory<Any> {
    /// Connect to the directory database and define its schema.
    pub async fn connect(config: &SurrealConfig) -> StoreResult<Self> {
        let db = config.open(&config.directory_database).await?;
        Self::with_schema(db).await
    }
}

impl<C: Connection> SurrealDirectory<C> {
    /// Wrap an existing connection whose namespace and database are
    /// already selected.
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Wrap an existing connection and define the directory schema.
    pub async fn with_schema(db: Surreal<C>) -> StoreResult<Self> {
        let response = db.query(DIRECTORY_SCHEMA).await?;
        check(response, "schema", "directory")?;
        debug!("Directory schema defined");
        Ok(Self { db })
    }

    async fn select_organization(&self, name: &str) -> StoreResult<Option<Organization>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {ORGANIZATION_FIELDS} FROM organization \
                 WHERE organization_name = $name LIMIT 1"
            ))
            .bind(("name", name.to_string()))
            .await?;

        let rows: Vec<OrganizationRow> = response.take(0)?;
        rows.into_iter()
            .next()
            .map(OrganizationRow::try_into_organization)
            .transpose()
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> StoreResult<bool> {
        match self.find_admin_by_email(email).await {
            Ok(admin) => Ok(Some(admin.id) != except),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<C: Connection> DirectoryStore for SurrealDirectory<C> {
    async fn create_organization(&self, organization: Organization, admin: Admin) -> StoreResult<()> {
        if self
            .select_organization(&organization.organization_name)
            .await?
            .is_some()
        {
            return Err(StoreError::duplicate(
                "organization",
                organization.organization_name,
            ));
        }
        if self.email_taken(&admin.email, None).await? {
            return Err(StoreError::duplicate("admin", admin.email));
        }

        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 CREATE type::thing('admin', $admin_id) SET \
                     email = $email, organization_name = $organization_name, \
                     password_hash = $password_hash, created_at = $admin_created_at;
                 CREATE type::thing('organization', $organization_id) SET \
                     organization_name = $organization_name, admin_id = $admin_id, \
                     admin_email = $email, collection_name = $collection_name, \
                     tenant_database = $tenant_database, created_at = $created_at, \
                     updated_at = $updated_at;
                 COMMIT TRANSACTION;",
            )
            .bind(("admin_id", admin.id.to_string()))
            .bind(("email", admin.email))
            .bind(("organization_name", organization.organization_name.clone()))
            .bind(("password_hash", admin.password_hash))
            .bind(("admin_created_at", admin.created_at.to_rfc3339()))
            .bind(("organization_id", organization.id.to_string()))
            .bind(("collection_name", organization.collection_name))
            .bind(("tenant_database", organization.tenant_database))
            .bind(("created_at", organization.created_at.to_rfc3339()))
            .bind(("updated_at", organization.updated_at.to_rfc3339()))
            .await?;

        check(response, "organization", &organization.organization_name)?;
        Ok(())
    }

    async fn find_organization(&self, name: &str) -> StoreResult<Organization> {
        self.select_organization(name)
            .await?
            .ok_or_else(|| StoreError::not_found("organization", name))
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Admin> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {ADMIN_FIELDS} FROM admin WHERE email = $email LIMIT 1"
            ))
            .bind(("email", email.to_string()))
            .await?;

        let rows: Vec<AdminRow> = response.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("admin", email))?
            .try_into_admin()
    }

    async fn find_admin(&self, admin_id: Uuid) -> StoreResult<Admin> {
        let key = admin_id.to_string();
        let mut response = self
            .db
            .query(format!(
                "SELECT {ADMIN_FIELDS} FROM type::thing('admin', $id)"
            ))
            .bind(("id", key.clone()))
            .await?;

        let rows: Vec<AdminRow> = response.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("admin", key))?
            .try_into_admin()
    }

    async fn update_organization(
        &self,
        current_name: &str,
        changes: OrganizationChanges,
    ) -> StoreResult<Organization> {
        let mut organization = self.find_organization(current_name).await?;
        let admin = self.find_admin(organization.admin_id).await?;

        if let Some(new_name) = &changes.organization_name {
            if new_name != current_name && self.select_organization(new_name).await?.is_some() {
                return Err(StoreError::duplicate("organization", new_name.clone()));
            }
        }
        if let Some(email) = &changes.admin_email {
            if self.email_taken(email, Some(admin.id)).await? {
                return Err(StoreError::duplicate("admin", email.clone()));
            }
        }

        organization.apply(&changes);
        let password_hash = changes.password_hash.unwrap_or(admin.password_hash);

        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 UPDATE type::thing('organization', $organization_id) SET \
                     organization_name = $organization_name, \
                     collection_name = $collection_name, \
                     admin_email = $admin_email, updated_at = $updated_at;
                 UPDATE admin SET organization_name = $organization_name \
                     WHERE organization_name = $current_name;
                 UPDATE type::thing('admin', $admin_id) SET \
                     organization_name = $organization_name, \
                     email = $admin_email, password_hash = $password_hash;
                 COMMIT TRANSACTION;",
            )
            .bind(("organization_id", organization.id.to_string()))
            .bind(("organization_name", organization.organization_name.clone()))
            .bind(("collection_name", organization.collection_name.clone()))
            .bind(("admin_email", organization.admin_email.clone()))
            .bind(("updated_at", organization.updated_at.to_rfc3339()))
            .bind(("current_name", current_name.to_string()))
            .bind(("admin_id", admin.id.to_string()))
            .bind(("password_hash", password_hash))
            .await?;

        check(response, "organization", &organization.organization_name)?;
        Ok(organization)
    }

    async fn delete_organization(&self, name: &str) -> StoreResult<Organization> {
        let organization = self.find_organization(name).await?;

        let response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 DELETE type::thing('organization', $organization_id);
                 DELETE type::thing('admin', $admin_id);
                 DELETE admin WHERE organization_name = $name;
                 COMMIT TRANSACTION;",
            )
            .bind(("organization_id", organization.id.to_string()))
            .bind(("admin_id", organization.admin_id.to_string()))
            .bind(("name", name.to_string()))
            .await?;

        check(response, "organization", name)?;
        Ok(organization)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.health().await?;
        Ok(())
    }
}

/// SurrealDB tenant collections.
///
/// Each collection is a schemaless table. Defined collections are also
/// registered in `tenant_collection` so that empty collections are
/// distinguishable from missing ones.
#[derive(Clone)]
pub struct SurrealCollections<C: Connection = Any> {
    db: Surreal<C>,
    tenant_database: String,
}

impl SurrealCollections<Any> {
    /// Connect to the tenant database and define the registry table.
    pub async fn connect(config: &SurrealConfig) -> StoreResult<Self> {
        let db = config.open(&config.tenant_database).await?;
        Self::with_schema(db, config.tenant_database.clone()).await
    }
}

impl<C: Connection> SurrealCollections<C> {
    /// Wrap an existing connection and define the registry table.
    pub async fn with_schema(db: Surreal<C>, tenant_database: impl Into<String>) -> StoreResult<Self> {
        let response = db.query(TENANT_SCHEMA).await?;
        check(response, "schema", "tenant")?;
        Ok(Self {
            db,
            tenant_database: tenant_database.into(),
        })
    }

    /// Collection names end up in DDL, so only derived names are accepted.
    fn validated(collection: &str) -> StoreResult<&str> {
        if is_valid_collection_name(collection) {
            Ok(collection)
        } else {
            Err(StoreError::Backend(format!(
                "invalid collection name: {collection}"
            )))
        }
    }
}

#[async_trait]
impl<C: Connection> TenantCollections for SurrealCollections<C> {
    fn tenant_database(&self) -> &str {
        &self.tenant_database
    }

    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        let mut response = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM type::thing('tenant_collection', $name)")
            .bind(("name", collection.to_string()))
            .await?;

        let rows: Vec<CollectionRow> = response.take(0)?;
        Ok(!rows.is_empty())
    }

    async fn create_collection(&self, collection: &str) -> StoreResult<()> {
        let name = Self::validated(collection)?;
        if self.collection_exists(name).await? {
            return Err(StoreError::duplicate("collection", name));
        }

        let response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION;
                 CREATE type::thing('tenant_collection', $name) SET created_at = time::now();
                 DEFINE TABLE {name} SCHEMALESS;
                 COMMIT TRANSACTION;"
            ))
            .bind(("name", name.to_string()))
            .await?;

        check(response, "collection", name)?;
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        let name = Self::validated(collection)?;

        let response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION;
                 REMOVE TABLE IF EXISTS {name};
                 DELETE type::thing('tenant_collection', $name);
                 COMMIT TRANSACTION;"
            ))
            .bind(("name", name.to_string()))
            .await?;

        check(response, "collection", name)?;
        Ok(())
    }

    async fn rename_collection(&self, from: &str, to: &str) -> StoreResult<()> {
        let from = Self::validated(from)?;
        let to = Self::validated(to)?;
        if self.collection_exists(to).await? {
            return Err(StoreError::duplicate("collection", to));
        }

        let response = self
            .db
            .query(format!(
                "BEGIN TRANSACTION;
                 CREATE type::thing('tenant_collection', $to) SET created_at = time::now();
                 DEFINE TABLE {to} SCHEMALESS;
                 INSERT INTO {to} (SELECT * OMIT id FROM {from});
                 REMOVE TABLE IF EXISTS {from};
                 DELETE type::thing('tenant_collection', $from);
                 COMMIT TRANSACTION;"
            ))
            .bind(("from", from.to_string()))
            .bind(("to", to.to_string()))
            .await?;

        check(response, "collection", to)?;
        Ok(())
    }

    async fn insert_document(
        &self,
        collection: &str,
        mut document: serde_json::Value,
    ) -> StoreResult<String> {
        let name = Self::validated(collection)?;
        if !self.collection_exists(name).await? {
            return Err(StoreError::not_found("collection", name));
        }

        // The record key is generated here; a caller-supplied `id` would
        // collide with it.
        if let Some(fields) = document.as_object_mut() {
            fields.remove("id");
        }

        let id = Uuid::now_v7().to_string();
        let response = self
            .db
            .query("CREATE type::thing($collection, $id) CONTENT $document")
            .bind(("collection", name.to_string()))
            .bind(("id", id.clone()))
            .bind(("document", document))
            .await?;

        check(response, "document", &id)?;
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let name = Self::validated(collection)?;

        let response = self
            .db
            .query("DELETE type::thing($collection, $id)")
            .bind(("collection", name.to_string()))
            .bind(("id", id.to_string()))
            .await?;

        check(response, "document", id)?;
        Ok(())
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<u64> {
        let name = Self::validated(collection)?;
        if !self.collection_exists(name).await? {
            return Ok(0);
        }

        let mut response = self
            .db
            .query("SELECT count() AS total FROM type::table($collection) GROUP ALL")
            .bind(("collection", name.to_string()))
            .await?;

        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
