use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::authz::engine::Authorizer;
use crate::authz::errors::AuthzError;
use crate::authz::identity::IdentityProvider;
use crate::authz::types::{
    CanRequest, CheckRequest, CheckResponse, MyRoleResponse, PermissionSet, Role,
};

#[derive(Clone)]
pub struct AuthzWebState {
    pub authz: Authorizer,
    pub identity: Arc<dyn IdentityProvider>,
}

pub fn router(state: AuthzWebState) -> Router {
    Router::new()
        .route("/v1/roles", get(list_roles))
        .route("/v1/roles/{role_id}", get(get_role))
        .route("/v1/me/role", get(my_role))
        .route("/v1/me/can", post(my_can))
        .route("/v1/check", post(handle_check))
        .route("/healthz", get(health))
        .with_state(state)
}

/// GET /v1/roles
/// Roles and their permissions are not secret; no identity required.
async fn list_roles(State(state): State<AuthzWebState>) -> Result<Json<Vec<Role>>, AuthzError> {
    Ok(Json(state.authz.list_roles().await?))
}

/// GET /v1/roles/{role_id}
async fn get_role(
    State(state): State<AuthzWebState>,
    Path(role_id): Path<String>,
) -> Result<Json<Role>, AuthzError> {
    state
        .authz
        .find_role(&role_id)
        .await?
        .map(Json)
        .ok_or(AuthzError::RoleNotFound(role_id))
}

/// GET /v1/me/role
/// The caller's role and own assignment record, `{}` for anonymous callers.
async fn my_role(
    State(state): State<AuthzWebState>,
    headers: HeaderMap,
) -> Result<Json<MyRoleResponse>, AuthzError> {
    let Some(user_id) = state.identity.current_user_id(&headers).await? else {
        return Ok(Json(MyRoleResponse::default()));
    };

    let assignment = state.authz.assignment(&user_id).await?;
    let role = state.authz.current_role(Some(&user_id)).await?;

    Ok(Json(MyRoleResponse { role, assignment }))
}

/// POST /v1/me/can
async fn my_can(
    State(state): State<AuthzWebState>,
    headers: HeaderMap,
    payload: Result<Json<CanRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, AuthzError> {
    let Json(req) = payload?;
    let permissions = PermissionSet::from_json(&req.permissions)?;
    let user_id = state.identity.current_user_id(&headers).await?;
    let allowed = state.authz.user_can(permissions, user_id.as_deref()).await?;
    Ok(Json(CheckResponse { allowed }))
}

/// POST /v1/check
async fn handle_check(
    State(state): State<AuthzWebState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, AuthzError> {
    let Json(req) = payload?;
    let permissions = PermissionSet::from_json(&req.permissions)?;

    let allowed = match (req.user_id.as_deref(), req.role_id.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(AuthzError::InvalidRequest(
                "pass either `user_id` or `role_id`, not both".to_string(),
            ))
        }
        (None, Some(role_id)) => state.authz.role_can(permissions, Some(role_id)).await?,
        (user_id, None) => state.authz.user_can(permissions, user_id).await?,
    };

    Ok(Json(CheckResponse { allowed }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
