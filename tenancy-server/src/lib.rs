//! # Tenancy Server
//!
//! Organization management service: organization and admin CRUD over a
//! master directory, one tenant collection per organization, and JWT
//! bearer authentication for updates and deletes.
//!
//! ## Modules
//!
//! - [`service`]: the organization lifecycle (create, login, get, update,
//!   delete)
//! - [`config`]: environment configuration
//! - [`health`]: liveness and readiness checks
//! - [`http`]: axum router, extractors and JSON errors
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenancy_auth::{JwtService, PasswordHasher};
//! use tenancy_server::{http, OrganizationService};
//! use tenancy_store::MemoryStore;
//!
//! async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let jwt = Arc::new(JwtService::with_secret("s3cret")?);
//!     let service = OrganizationService::new(store.clone(), store, jwt, PasswordHasher::default());
//!
//!     let app = http::router(http::AppState::new(Arc::new(service)), &[]);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod service;

// Re-export main types
pub use config::{ConfigError, ServerConfig, StoreBackend};
pub use error::{OrgError, OrgResult};
pub use health::{HealthChecker, LivenessResult, ReadinessResult};
pub use service::{NewOrganization, OrganizationService, OrganizationUpdate};
