//! HTTP surface tests driving the router directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tenancy_auth::{JwtService, PasswordHasher};
use tenancy_server::http::{router, AppState};
use tenancy_server::OrganizationService;
use tenancy_store::{MemoryStore, TenantCollections};
use tower::ServiceExt;

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let jwt = Arc::new(JwtService::with_secret("http-secret").unwrap());
    let service = OrganizationService::new(store.clone(), store.clone(), jwt, PasswordHasher::new(4));
    let origins = vec!["http://localhost:3000".to_string()];
    (store, router(AppState::new(Arc::new(service)), &origins))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn create_and_login(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            Method::POST,
            "/org/create",
            json!({"organization_name": name, "email": email, "password": password}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/admin/login",
            json!({"email": email, "password": password}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_liveness_reports_service_name() {
    let (_, app) = app();
    let (status, body) = send(&app, bare_request(Method::GET, "/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "Org Management Service"}));
}

#[tokio::test]
async fn test_readiness_pings_store() {
    let (_, app) = app();
    let (status, body) = send(&app, bare_request(Method::GET, "/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_create_returns_summary() {
    let (store, app) = app();
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/org/create",
            json!({
                "organization_name": "Tredence Demo",
                "email": "admin@tredence.com",
                "password": "Admin@123"
            }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Organization created successfully");
    assert_eq!(body["organization"]["name"], "Tredence Demo");
    assert_eq!(body["organization"]["collection_name"], "org_tredence_demo");
    assert_eq!(body["organization"]["db_name"], "orgs_db");
    assert!(store.collection_exists("org_tredence_demo").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_create_is_conflict() {
    let (_, app) = app();
    create_and_login(&app, "Acme", "owner@acme.test", "pw").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/org/create",
            json!({"organization_name": "Acme", "email": "other@acme.test", "password": "pw"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DUPLICATE");
}

#[tokio::test]
async fn test_invalid_payloads_are_json_errors() {
    let (_, app) = app();

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/org/create",
            json!({"organization_name": "Acme", "email": "not-an-email", "password": "pw"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/org/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"organization_name\":"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = send(&app, bare_request(Method::GET, "/org/get", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_failures() {
    let (_, app) = app();
    create_and_login(&app, "Acme", "owner@acme.test", "pw").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/login",
            json!({"email": "owner@acme.test", "password": "wrong"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/login",
            json!({"email": "ghost@acme.test", "password": "pw"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_returns_metadata_without_secrets() {
    let (_, app) = app();
    create_and_login(&app, "Acme Corp", "owner@acme.test", "pw").await;

    let (status, body) = send(
        &app,
        bare_request(Method::GET, "/org/get?organization_name=Acme%20Corp", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_name"], "Acme Corp");
    assert_eq!(body["admin_email"], "owner@acme.test");
    assert_eq!(body["collection_name"], "org_acme_corp");
    assert!(body.get("password_hash").is_none());

    let (status, _) = send(
        &app,
        bare_request(Method::GET, "/org/get?organization_name=Nope", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_checks_token_before_payload() {
    let (_, app) = app();
    create_and_login(&app, "Acme", "owner@acme.test", "pw").await;

    let (status, body) = send(
        &app,
        json_request(Method::PUT, "/org/update", json!({"bogus": true}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_CREDENTIALS");

    let (status, body) = send(
        &app,
        json_request(Method::PUT, "/org/update", json!({"bogus": true}), Some("garbage")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_update_for_other_organization_is_forbidden() {
    let (_, app) = app();
    create_and_login(&app, "Acme", "owner@acme.test", "pw").await;
    let globex = create_and_login(&app, "Globex", "owner@globex.test", "pw").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/org/update",
            json!({"current_organization_name": "Acme", "new_organization_name": "Mine"}),
            Some(&globex),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        bare_request(Method::DELETE, "/org/delete?organization_name=Acme", Some(&globex)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tredence_scenario_over_http() {
    let (store, app) = app();
    let token = create_and_login(&app, "Tredence Demo", "admin@tredence.com", "Admin@123").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/org/update",
            json!({
                "current_organization_name": "Tredence Demo",
                "new_organization_name": "Tredence Global"
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Organization updated");
    assert_eq!(body["organization"]["organization_name"], "Tredence Global");

    let (status, _) = send(
        &app,
        bare_request(Method::GET, "/org/get?organization_name=Tredence%20Demo", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        bare_request(Method::GET, "/org/get?organization_name=Tredence%20Global", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        bare_request(
            Method::DELETE,
            "/org/delete?organization_name=Tredence%20Global",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Organization 'Tredence Global' and related data deleted"
    );
    assert!(!store.collection_exists("org_tredence_global").await.unwrap());

    let (status, _) = send(
        &app,
        bare_request(Method::GET, "/org/get?organization_name=Tredence%20Global", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_configured_origin_with_credentials() {
    let (_, app) = app();
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/org/create")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let res = app.oneshot(preflight).await.unwrap();
    let headers = res.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
