//! # Tenancy Authentication
//!
//! Credential handling for organization admins.
//!
//! ## Overview
//!
//! The tenancy-auth crate handles:
//! - **Passwords**: bcrypt hashing and fail-closed verification
//! - **JWT**: Access token issuance and validation
//! - **Bearer**: `Authorization: Bearer <token>` header parsing
//!
//! ## Usage
//!
//! ```rust
//! use tenancy_auth::{JwtService, PasswordHasher};
//! use uuid::Uuid;
//!
//! let hasher = PasswordHasher::new(4);
//! let digest = hasher.hash("Admin@123").unwrap();
//! assert!(hasher.verify("Admin@123", &digest));
//!
//! let jwt = JwtService::with_secret("a-long-shared-secret").unwrap();
//! let token = jwt.issue(Uuid::now_v7(), "admin@acme.test", "Acme Corp").unwrap();
//! let claims = jwt.verify(&token.access_token).unwrap();
//! assert_eq!(claims.organization_name, "Acme Corp");
//! ```

pub mod bearer;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;

// Re-export main types
pub use bearer::parse_bearer;
pub use claims::AdminClaims;
pub use error::{AuthError, AuthResult};
pub use jwt::{AccessToken, JwtAlgorithm, JwtConfig, JwtService};
pub use password::PasswordHasher;
