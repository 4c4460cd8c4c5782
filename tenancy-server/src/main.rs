use std::sync::Arc;

use anyhow::Context;
use tenancy_auth::{JwtService, PasswordHasher};
use tenancy_server::{http, OrganizationService, ServerConfig, StoreBackend};
use tenancy_store::{DirectoryStore, MemoryStore, TenantCollections};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Err(e) = config.validate_for_production() {
        warn!(error = %e, "Configuration is not suitable for production");
    }

    let (directory, collections) = open_store(&config).await?;

    let jwt = JwtService::new(config.jwt_config()).context("Failed to initialise token service")?;
    let service = OrganizationService::new(
        directory,
        collections,
        Arc::new(jwt),
        PasswordHasher::new(config.bcrypt_cost),
    );

    let app = http::router(http::AppState::new(Arc::new(service)), &config.cors_origins);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Org Management Service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn open_store(
    config: &ServerConfig,
) -> anyhow::Result<(Arc<dyn DirectoryStore>, Arc<dyn TenantCollections>)> {
    match &config.store {
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::with_tenant_database(
                config.tenant_database.clone(),
            ));
            let directory: Arc<dyn DirectoryStore> = store.clone();
            let collections: Arc<dyn TenantCollections> = store;
            Ok((directory, collections))
        }
        #[cfg(feature = "surreal")]
        StoreBackend::Surreal { url } => {
            use tenancy_store::{SurrealCollections, SurrealConfig, SurrealDirectory};

            let surreal = SurrealConfig {
                url: url.clone(),
                namespace: config.surreal_namespace.clone(),
                directory_database: config.directory_database.clone(),
                tenant_database: config.tenant_database.clone(),
                username: config.surreal_username.clone(),
                password: config.surreal_password.clone(),
            };
            let directory: Arc<dyn DirectoryStore> = Arc::new(
                SurrealDirectory::connect(&surreal)
                    .await
                    .context("Failed to open directory database")?,
            );
            let collections: Arc<dyn TenantCollections> = Arc::new(
                SurrealCollections::connect(&surreal)
                    .await
                    .context("Failed to open tenant database")?,
            );
            Ok((directory, collections))
        }
        #[cfg(not(feature = "surreal"))]
        StoreBackend::Surreal { .. } => {
            anyhow::bail!("STORE_BACKEND=surreal requires building with the `surreal` feature")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
