//! Server configuration.
//!
//! Loaded from environment variables (a `.env` file is read first by the
//! binary) with defaults suitable for local development.

use chrono::Duration;
use tenancy_auth::{JwtAlgorithm, JwtConfig};
use thiserror::Error;

/// JWT secret used when `JWT_SECRET` is unset. Never acceptable in production.
pub const DEFAULT_JWT_SECRET: &str = "changeme";

/// Longest accepted token lifetime (one year).
pub const MAX_JWT_EXPIRES_MINUTES: i64 = 365 * 24 * 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store; data is lost on restart
    Memory,
    /// SurrealDB at the given endpoint URL
    Surreal {
        /// Endpoint URL (e.g., `ws://127.0.0.1:8000`, `mem://`)
        url: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Shared secret for signing admin tokens.
    pub jwt_secret: String,

    /// Token signing algorithm.
    pub jwt_algorithm: JwtAlgorithm,

    /// Token lifetime in minutes.
    pub jwt_expires_minutes: i64,

    /// bcrypt cost for admin passwords.
    pub bcrypt_cost: u32,

    /// Storage backend.
    pub store: StoreBackend,

    /// SurrealDB namespace.
    pub surreal_namespace: String,

    /// SurrealDB root username.
    pub surreal_username: Option<String>,

    /// SurrealDB root password.
    pub surreal_password: Option<String>,

    /// Database holding organization and admin records.
    pub directory_database: String,

    /// Database holding tenant collections.
    pub tenant_database: String,

    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_algorithm: JwtAlgorithm::HS256,
            jwt_expires_minutes: 60,
            bcrypt_cost: 12,
            store: StoreBackend::Memory,
            surreal_namespace: "tenancy".to_string(),
            surreal_username: None,
            surreal_password: None,
            directory_database: "master_db".to_string(),
            tenant_database: "orgs_db".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HTTP_HOST`: Interface to bind (default: 127.0.0.1)
    /// - `HTTP_PORT`: Port to bind (default: 8000)
    /// - `JWT_SECRET`: Token signing secret (default: changeme)
    /// - `JWT_ALGORITHM`: HS256, HS384 or HS512 (default: HS256)
    /// - `JWT_EXPIRES_MINUTES`: Token lifetime, at most one year (default: 60)
    /// - `BCRYPT_COST`: bcrypt cost, 4 to 31 (default: 12)
    /// - `STORE_BACKEND`: `memory` or `surreal` (default: memory)
    /// - `SURREAL_URL`: SurrealDB endpoint, required for the surreal backend
    /// - `SURREAL_NAMESPACE`: SurrealDB namespace (default: tenancy)
    /// - `SURREAL_USER` / `SURREAL_PASS`: Root credentials (default: unset)
    /// - `DIRECTORY_DATABASE`: Directory database (default: master_db)
    /// - `TENANT_DATABASE`: Tenant database (default: orgs_db)
    /// - `CORS_ORIGINS`: Comma-separated allowed origins
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match var("STORE_BACKEND")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("memory") => StoreBackend::Memory,
            Some("surreal") => StoreBackend::Surreal {
                url: var("SURREAL_URL")
                    .ok_or_else(|| ConfigError::MissingEnvVar("SURREAL_URL".to_string()))?,
            },
            Some(other) => {
                return Err(ConfigError::invalid(
                    "STORE_BACKEND",
                    format!("unknown backend {other} (expected memory or surreal)"),
                ))
            }
        };

        let jwt_algorithm = match var("JWT_ALGORITHM") {
            Some(s) => s
                .parse::<JwtAlgorithm>()
                .map_err(|e| ConfigError::invalid("JWT_ALGORITHM", e.to_string()))?,
            None => default.jwt_algorithm,
        };

        let bcrypt_cost = parse_or(var("BCRYPT_COST"), "BCRYPT_COST", default.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::invalid("BCRYPT_COST", "must be between 4 and 31"));
        }

        let jwt_expires_minutes =
            parse_or(var("JWT_EXPIRES_MINUTES"), "JWT_EXPIRES_MINUTES", default.jwt_expires_minutes)?;
        if !(1..=MAX_JWT_EXPIRES_MINUTES).contains(&jwt_expires_minutes) {
            return Err(ConfigError::invalid(
                "JWT_EXPIRES_MINUTES",
                format!("must be between 1 and {MAX_JWT_EXPIRES_MINUTES}"),
            ));
        }

        Ok(Self {
            host: var("HTTP_HOST").unwrap_or(default.host),
            port: parse_or(var("HTTP_PORT"), "HTTP_PORT", default.port)?,
            jwt_secret: var("JWT_SECRET").unwrap_or(default.jwt_secret),
            jwt_algorithm,
            jwt_expires_minutes,
            bcrypt_cost,
            store,
            surreal_namespace: var("SURREAL_NAMESPACE").unwrap_or(default.surreal_namespace),
            surreal_username: var("SURREAL_USER"),
            surreal_password: var("SURREAL_PASS"),
            directory_database: var("DIRECTORY_DATABASE").unwrap_or(default.directory_database),
            tenant_database: var("TENANT_DATABASE").unwrap_or(default.tenant_database),
            cors_origins: var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(default.cors_origins),
        })
    }

    /// Address to bind, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Token service configuration.
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: Some(self.jwt_secret.clone()),
            algorithm: self.jwt_algorithm,
            access_token_duration: Duration::minutes(self.jwt_expires_minutes),
            ..Default::default()
        }
    }

    /// Whether the token secret is still the development default.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Validate that the configuration is safe for production.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.uses_default_secret() {
            return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
        }
        if self.store == StoreBackend::Memory {
            return Err(ConfigError::invalid(
                "STORE_BACKEND",
                "the memory backend does not persist data",
            ));
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(s) => s
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.jwt_algorithm, JwtAlgorithm::HS256);
        assert_eq!(config.jwt_expires_minutes, 60);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.directory_database, "master_db");
        assert_eq!(config.tenant_database, "orgs_db");
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.uses_default_secret());
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_PORT", "9000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_ALGORITHM", "hs512"),
            ("STORE_BACKEND", "surreal"),
            ("SURREAL_URL", "ws://db:8000"),
            ("CORS_ORIGINS", "https://app.test, https://admin.test,"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.jwt_algorithm, JwtAlgorithm::HS512);
        assert_eq!(
            config.store,
            StoreBackend::Surreal {
                url: "ws://db:8000".into()
            }
        );
        assert_eq!(config.cors_origins, vec!["https://app.test", "https://admin.test"]);
        assert!(config.validate_for_production().is_ok());
        assert_eq!(config.jwt_config().access_token_duration, Duration::minutes(60));
    }

    #[test]
    fn test_longest_token_lifetime_still_issues() {
        let config = load(&[("JWT_EXPIRES_MINUTES", &MAX_JWT_EXPIRES_MINUTES.to_string())]).unwrap();
        let jwt = tenancy_auth::JwtService::new(config.jwt_config()).unwrap();
        let token = jwt
            .issue(uuid::Uuid::now_v7(), "a@acme.test", "Acme")
            .unwrap();
        assert_eq!(token.expires_in, MAX_JWT_EXPIRES_MINUTES * 60);
    }

    #[test]
    fn test_surreal_requires_url() {
        let err = load(&[("STORE_BACKEND", "surreal")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SURREAL_URL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("HTTP_PORT", "eighty")]).is_err());
        assert!(load(&[("JWT_ALGORITHM", "RS256")]).is_err());
        assert!(load(&[("BCRYPT_COST", "2")]).is_err());
        assert!(load(&[("JWT_EXPIRES_MINUTES", "0")]).is_err());
        assert!(load(&[("JWT_EXPIRES_MINUTES", "100000000000000")]).is_err());
        assert!(load(&[("STORE_BACKEND", "redis")]).is_err());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = load(&[("STORE_BACKEND", "surreal"), ("SURREAL_URL", "mem://")]).unwrap();
        assert!(matches!(
            config.validate_for_production(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }
}
