//! Request handlers and payloads.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tenancy_auth::AccessToken;
use tenancy_org::{Organization, OrganizationSummary};
use validator::Validate;

use super::error::{ApiError, ApiResult};
use super::extract::{BearerToken, ValidJson, ValidQuery};
use super::AppState;
use crate::health::LivenessResult;
use crate::service::{NewOrganization, OrganizationUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub organization_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationQuery {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub organization_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub current_organization_name: String,
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub new_organization_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub new_email: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub organization: OrganizationSummary,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub message: String,
    pub organization: Organization,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn liveness(State(state): State<AppState>) -> Json<LivenessResult> {
    Json(state.health.check_liveness())
}

pub async fn readiness(State(state): State<AppState>) -> Response {
    let result = state.health.check_readiness().await;
    let status = if result.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(result)).into_response()
}

pub async fn create_organization(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let organization = state
        .service
        .create(NewOrganization {
            organization_name: req.organization_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Organization created successfully".to_string(),
            organization: organization.summary(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AccessToken>> {
    let token = state.service.login(&req.email, &req.password).await?;
    Ok(Json(token))
}

pub async fn get_organization(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<OrganizationQuery>,
) -> ApiResult<Json<Organization>> {
    let organization = state.service.get(&query.organization_name).await?;
    Ok(Json(organization))
}

/// The token is verified before the payload is looked at, so an
/// unauthenticated caller gets 401 even for a malformed body.
pub async fn update_organization(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    payload: Result<ValidJson<UpdateOrganizationRequest>, ApiError>,
) -> ApiResult<Json<UpdatedResponse>> {
    let admin = state.service.authenticate(&token).await?;
    let ValidJson(req) = payload?;

    let organization = state
        .service
        .update_as(
            &admin,
            OrganizationUpdate {
                current_organization_name: req.current_organization_name,
                new_organization_name: req.new_organization_name,
                new_email: req.new_email,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(Json(UpdatedResponse {
        message: "Organization updated".to_string(),
        organization,
    }))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    query: Result<ValidQuery<OrganizationQuery>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    let admin = state.service.authenticate(&token).await?;
    let ValidQuery(query) = query?;

    let organization = state
        .service
        .delete_as(&admin, &query.organization_name)
        .await?;

    Ok(Json(MessageResponse {
        message: format!(
            "Organization '{}' and related data deleted",
            organization.organization_name
        ),
    }))
}
