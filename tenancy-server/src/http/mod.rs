//! HTTP surface.
//!
//! | Route | Auth |
//! |---|---|
//! | `GET /` | none |
//! | `GET /health/ready` | none |
//! | `POST /org/create` | none |
//! | `POST /admin/login` | none |
//! | `GET /org/get?organization_name=` | none |
//! | `PUT /org/update` | bearer |
//! | `DELETE /org/delete?organization_name=` | bearer |

pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::health::HealthChecker;
use crate::service::OrganizationService;

pub use error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrganizationService>,
    pub health: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(service: Arc<OrganizationService>) -> Self {
        let health = Arc::new(HealthChecker::new(service.clone()));
        Self { service, health }
    }
}

/// Build the router with CORS restricted to `cors_origins`.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness))
        .route("/org/create", post(handlers::create_organization))
        .route("/org/get", get(handlers::get_organization))
        .route("/org/update", put(handlers::update_organization))
        .route("/org/delete", delete(handlers::delete_organization))
        .route("/admin/login", post(handlers::login))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
