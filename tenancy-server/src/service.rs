//! Organization lifecycle
//!
//! Orchestrates the master directory, tenant provisioning, password
//! hashing and token issuance. Each organization moves through
//! `NonExistent -> Active -> Deleted`; a deleted name can be registered
//! again because uniqueness is checked against live records only.
//!
//! Update and delete authorize by the admin identity carried in the token,
//! not by the organization name claim, so a token issued before a rename
//! keeps working for the renamed organization.

use std::sync::Arc;

use tenancy_auth::{AccessToken, AuthError, JwtService, PasswordHasher};
use tenancy_org::{normalize_email, normalize_name, Admin, Organization, OrganizationChanges};
use tenancy_store::{DirectoryStore, StoreResult, TenantCollections, TenantProvisioner};
use tracing::{error, info, instrument, warn};

use crate::error::{OrgError, OrgResult};

/// Input for [`OrganizationService::create`].
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub organization_name: String,
    pub email: String,
    pub password: String,
}

/// Input for [`OrganizationService::update`].
///
/// Every `new_*` field is optional; absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdate {
    pub current_organization_name: String,
    pub new_organization_name: Option<String>,
    pub new_email: Option<String>,
    pub new_password: Option<String>,
}

/// Organization lifecycle service.
///
/// Holds explicit store handles; cheap to share behind an `Arc`.
pub struct OrganizationService {
    directory: Arc<dyn DirectoryStore>,
    provisioner: TenantProvisioner,
    jwt: Arc<JwtService>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for OrganizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationService")
            .field("provisioner", &self.provisioner)
            .field("jwt", &self.jwt)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl OrganizationService {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        collections: Arc<dyn TenantCollections>,
        jwt: Arc<JwtService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            directory,
            provisioner: TenantProvisioner::new(collections),
            jwt,
            hasher,
        }
    }

    /// The tenant collection provisioner.
    pub fn provisioner(&self) -> &TenantProvisioner {
        &self.provisioner
    }

    /// The token service used to issue and verify admin tokens.
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Check that the directory backend is reachable.
    pub async fn ping(&self) -> OrgResult<()> {
        self.directory.ping().await?;
        Ok(())
    }

    /// Register an organization with its admin and tenant collection.
    ///
    /// If provisioning the collection fails the directory records are
    /// removed again and the provisioning error is returned.
    #[instrument(skip(self, input), fields(organization = %input.organization_name))]
    pub async fn create(&self, input: NewOrganization) -> OrgResult<Organization> {
        let name = required_name(&input.organization_name, "organization_name")?;
        let email = required_email(&input.email, "email")?;
        required_password(&input.password)?;

        if found(self.directory.find_organization(&name).await)?.is_some() {
            return Err(OrgError::Duplicate {
                entity: "organization".into(),
                key: name,
            });
        }
        if found(self.directory.find_admin_by_email(&email).await)?.is_some() {
            return Err(OrgError::Duplicate {
                entity: "admin".into(),
                key: email,
            });
        }
        let collection = self.provisioner.ensure_available(&name).await?;

        let password_hash = self.hash_password(input.password).await?;
        let admin = Admin::new(email, name.clone(), password_hash);
        let organization = Organization::new(
            name.clone(),
            &admin,
            collection,
            self.provisioner.tenant_database(),
        );

        self.directory
            .create_organization(organization.clone(), admin)
            .await?;

        if let Err(e) = self.provisioner.create_for(&name).await {
            warn!(error = %e, "Tenant provisioning failed, removing directory records");
            if let Err(cleanup) = self.directory.delete_organization(&name).await {
                error!(
                    error = %cleanup,
                    organization = %name,
                    "Failed to remove directory records after provisioning failure"
                );
            }
            return Err(e.into());
        }

        info!(
            organization_id = %organization.id,
            admin_id = %organization.admin_id,
            collection = %organization.collection_name,
            "Organization created"
        );
        Ok(organization)
    }

    /// Exchange admin credentials for an access token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> OrgResult<AccessToken> {
        let email = normalize_email(email);
        let admin = self.directory.find_admin_by_email(&email).await?;

        if !self.verify_password(password, &admin.password_hash).await? {
            warn!(admin_id = %admin.id, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let organization_name =
            match found(self.directory.find_organization(&admin.organization_name).await)? {
                Some(org) if org.admin_id == admin.id => org.organization_name,
                _ => admin.organization_name.clone(),
            };

        let token = self
            .jwt
            .issue(admin.id, admin.email.clone(), organization_name)?;
        info!(admin_id = %admin.id, "Admin logged in");
        Ok(token)
    }

    /// Look up organization metadata by name.
    #[instrument(skip(self))]
    pub async fn get(&self, organization_name: &str) -> OrgResult<Organization> {
        let name = required_name(organization_name, "organization_name")?;
        Ok(self.directory.find_organization(&name).await?)
    }

    /// Verify a bearer token and load the admin it identifies.
    ///
    /// A token whose admin no longer exists is invalid.
    pub async fn authenticate(&self, token: &str) -> OrgResult<Admin> {
        let claims = self.jwt.verify(token).inspect_err(|e| {
            warn!(error = %e, "Rejected bearer token");
        })?;

        match found(self.directory.find_admin(claims.admin_id).await)? {
            Some(admin) => Ok(admin),
            None => {
                warn!(admin_id = %claims.admin_id, "Token references a removed admin");
                Err(AuthError::InvalidToken("admin no longer exists".into()).into())
            }
        }
    }

    /// Apply a partial update after verifying `token`.
    pub async fn update(&self, token: &str, update: OrganizationUpdate) -> OrgResult<Organization> {
        let admin = self.authenticate(token).await?;
        self.update_as(&admin, update).await
    }

    /// Apply a partial update on behalf of an authenticated admin.
    ///
    /// A rename migrates the tenant collection to the newly derived name.
    /// If the directory update then fails the collection is moved back.
    #[instrument(
        skip(self, admin, update),
        fields(admin_id = %admin.id, organization = %update.current_organization_name)
    )]
    pub async fn update_as(&self, admin: &Admin, update: OrganizationUpdate) -> OrgResult<Organization> {
        let current = self.authorize(admin, &update.current_organization_name)?;
        let organization = self.directory.find_organization(&current).await?;

        let mut changes = OrganizationChanges::default();
        let mut renamed_to = None;

        if let Some(new_name) = &update.new_organization_name {
            let new_name = required_name(new_name, "new_organization_name")?;
            if new_name != current {
                if found(self.directory.find_organization(&new_name).await)?.is_some() {
                    return Err(OrgError::Duplicate {
                        entity: "organization".into(),
                        key: new_name,
                    });
                }
                let collection = self.provisioner.collection_name_for(&new_name);
                renamed_to = Some(new_name.clone());
                changes = changes.with_name(new_name, collection);
            }
        }

        if let Some(new_email) = &update.new_email {
            let new_email = required_email(new_email, "new_email")?;
            if new_email != admin.email {
                changes = changes.with_email(new_email);
            }
        }

        if let Some(new_password) = update.new_password {
            required_password(&new_password)?;
            changes = changes.with_password_hash(self.hash_password(new_password).await?);
        }

        if changes.is_empty() {
            return Ok(organization);
        }

        let mut moved_to = None;
        if let Some(new_name) = &renamed_to {
            let target = self
                .provisioner
                .rename(&organization.collection_name, new_name)
                .await?;
            if target != organization.collection_name {
                moved_to = Some(target);
            }
        }

        match self.directory.update_organization(&current, changes).await {
            Ok(updated) => {
                info!(
                    organization_id = %updated.id,
                    organization = %updated.organization_name,
                    "Organization updated"
                );
                Ok(updated)
            }
            Err(e) => {
                if let Some(target) = &moved_to {
                    self.restore_collection(target, &organization.collection_name)
                        .await;
                }
                Err(e.into())
            }
        }
    }

    /// Delete an organization after verifying `token`.
    pub async fn delete(&self, token: &str, organization_name: &str) -> OrgResult<Organization> {
        let admin = self.authenticate(token).await?;
        self.delete_as(&admin, organization_name).await
    }

    /// Delete an organization, its admin and its tenant collection on
    /// behalf of an authenticated admin.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn delete_as(&self, admin: &Admin, organization_name: &str) -> OrgResult<Organization> {
        let name = self.authorize(admin, organization_name)?;

        let organization = self.directory.delete_organization(&name).await?;
        self.provisioner
            .drop_named(&organization.collection_name)
            .await
            .inspect_err(|e| {
                error!(
                    error = %e,
                    collection = %organization.collection_name,
                    "Directory records removed but tenant collection drop failed"
                );
            })?;

        info!(organization_id = %organization.id, "Organization deleted");
        Ok(organization)
    }

    /// Require `admin` to administer `organization_name`, returning the
    /// normalized name.
    fn authorize(&self, admin: &Admin, organization_name: &str) -> OrgResult<String> {
        let name = required_name(organization_name, "organization_name")?;
        if !admin.belongs_to(&name) {
            warn!(admin_id = %admin.id, organization = %name, "Admin not authorized for organization");
            return Err(AuthError::Forbidden(format!("not authorized for organization {name}")).into());
        }
        Ok(name)
    }

    async fn restore_collection(&self, from: &str, to: &str) {
        match self.provisioner.relocate(from, to).await {
            Ok(()) => warn!(collection = %to, "Restored tenant collection after failed update"),
            Err(e) => error!(
                error = %e,
                from = %from,
                to = %to,
                "Failed to restore tenant collection after failed update"
            ),
        }
    }

    async fn hash_password(&self, password: String) -> OrgResult<String> {
        let hasher = self.hasher;
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))??;
        Ok(digest)
    }

    async fn verify_password(&self, password: &str, digest: &str) -> OrgResult<bool> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let digest = digest.to_owned();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?;
        Ok(matched)
    }
}

/// Turn a `NotFound` lookup into `None`.
fn found<T>(result: StoreResult<T>) -> OrgResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn required_name(value: &str, field: &str) -> OrgResult<String> {
    normalize_name(value).ok_or_else(|| OrgError::validation(format!("{field} must not be empty")))
}

fn required_email(value: &str, field: &str) -> OrgResult<String> {
    let email = normalize_email(value);
    if email.is_empty() || !email.contains('@') {
        return Err(OrgError::validation(format!("{field} must be an email address")));
    }
    Ok(email)
}

fn required_password(value: &str) -> OrgResult<()> {
    if value.is_empty() {
        return Err(OrgError::validation("password must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenancy_store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, OrganizationService) {
        let store = Arc::new(MemoryStore::new());
        let jwt = Arc::new(JwtService::with_secret("test-secret").unwrap());
        let service =
            OrganizationService::new(store.clone(), store.clone(), jwt, PasswordHasher::new(4));
        (store, service)
    }

    fn acme() -> NewOrganization {
        NewOrganization {
            organization_name: "  Acme Corp ".into(),
            email: "Owner@Acme.test".into(),
            password: "s3cret".into(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let (store, service) = service();
        let org = service.create(acme()).await.unwrap();

        assert_eq!(org.organization_name, "Acme Corp");
        assert_eq!(org.admin_email, "owner@acme.test");
        assert_eq!(org.collection_name, "org_acme_corp");
        assert_eq!(org.tenant_database, "orgs_db");
        assert!(store.collection_exists("org_acme_corp").await.unwrap());

        let admin = store.find_admin(org.admin_id).await.unwrap();
        assert_ne!(admin.password_hash, "s3cret");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let (store, service) = service();

        let mut input = acme();
        input.organization_name = "   ".into();
        assert!(matches!(service.create(input).await, Err(OrgError::Validation(_))));

        let mut input = acme();
        input.email = "not-an-email".into();
        assert!(matches!(service.create(input).await, Err(OrgError::Validation(_))));

        let mut input = acme();
        input.password = String::new();
        assert!(matches!(service.create(input).await, Err(OrgError::Validation(_))));

        assert_eq!(store.organization_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_collection_collision() {
        let (store, service) = service();
        service.create(acme()).await.unwrap();

        let input = NewOrganization {
            organization_name: "acme corp".into(),
            email: "other@acme.test".into(),
            password: "pw".into(),
        };
        let err = service.create(input).await.unwrap_err();
        assert!(matches!(err, OrgError::Duplicate { ref entity, .. } if entity == "collection"));
        assert_eq!(store.organization_count().await, 1);
    }

    #[tokio::test]
    async fn test_login_resolves_organization_name() {
        let (_, service) = service();
        let org = service.create(acme()).await.unwrap();

        let token = service.login(" OWNER@acme.test ", "s3cret").await.unwrap();
        let claims = service.jwt().verify(&token.access_token).unwrap();
        assert_eq!(claims.admin_id, org.admin_id);
        assert_eq!(claims.organization_name, "Acme Corp");
        assert_eq!(claims.email(), "owner@acme.test");
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_current() {
        let (_, service) = service();
        let org = service.create(acme()).await.unwrap();
        let token = service.login("owner@acme.test", "s3cret").await.unwrap();
        let admin = service.authenticate(&token.access_token).await.unwrap();

        let update = OrganizationUpdate {
            current_organization_name: "Acme Corp".into(),
            new_organization_name: Some("Acme Corp".into()),
            new_email: Some("OWNER@acme.test".into()),
            ..Default::default()
        };
        let unchanged = service.update_as(&admin, update).await.unwrap();
        assert_eq!(unchanged, org);
    }

    #[tokio::test]
    async fn test_update_restores_collection_when_directory_rejects() {
        let (store, service) = service();
        service.create(acme()).await.unwrap();
        let admin = store.find_admin_by_email("owner@acme.test").await.unwrap();

        // Another admin already holds the new email, so the directory
        // update fails after the collection has moved.
        service
            .create(NewOrganization {
                organization_name: "Globex".into(),
                email: "taken@globex.test".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        let update = OrganizationUpdate {
            current_organization_name: "Acme Corp".into(),
            new_organization_name: Some("Acme Global".into()),
            new_email: Some("taken@globex.test".into()),
            ..Default::default()
        };
        let err = service.update_as(&admin, update).await.unwrap_err();
        assert!(matches!(err, OrgError::Duplicate { .. }));

        assert!(store.collection_exists("org_acme_corp").await.unwrap());
        assert!(!store.collection_exists("org_acme_global").await.unwrap());
        assert!(service.get("Acme Corp").await.is_ok());
    }

    #[tokio::test]
    async fn test_token_for_removed_admin_is_invalid() {
        let (_, service) = service();
        service.create(acme()).await.unwrap();
        let token = service.login("owner@acme.test", "s3cret").await.unwrap();

        service
            .delete(&token.access_token, "Acme Corp")
            .await
            .unwrap();

        let err = service.authenticate(&token.access_token).await.unwrap_err();
        assert!(matches!(err, OrgError::Auth(AuthError::InvalidToken(_))));
    }
}
