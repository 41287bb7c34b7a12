use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::errors::GateError;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Access denied")]
    #[diagnostic(code(rolegate::authz::forbidden))]
    Forbidden,

    #[error("The role `{0}` does not exist")]
    #[diagnostic(
        code(rolegate::authz::role_not_found),
        help("Create the role first, or assign no role to clear the user's assignment")
    )]
    RoleNotFound(String),

    #[error("Invalid permissions: {0}")]
    #[diagnostic(
        code(rolegate::authz::invalid_permissions),
        help("Permissions must be a string or an array of strings")
    )]
    InvalidPermissions(String),

    #[error("The role id `{0}` is already taken")]
    #[diagnostic(
        code(rolegate::authz::duplicate_role),
        help("Role ids are never reused, including ids of deleted roles")
    )]
    DuplicateRole(String),

    #[error("Invalid user: {0}")]
    #[diagnostic(code(rolegate::authz::invalid_user))]
    InvalidUser(String),

    #[error("Invalid request: {0}")]
    #[diagnostic(code(rolegate::authz::invalid_request))]
    InvalidRequest(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] GateError),
}

impl From<sea_orm::DbErr> for AuthzError {
    fn from(value: sea_orm::DbErr) -> Self {
        AuthzError::Storage(GateError::Db(value))
    }
}

impl From<JsonRejection> for AuthzError {
    fn from(rejection: JsonRejection) -> Self {
        AuthzError::InvalidRequest(rejection.body_text())
    }
}

impl From<serde_json::Error> for AuthzError {
    fn from(value: serde_json::Error) -> Self {
        AuthzError::Storage(GateError::Serde(value))
    }
}

impl AuthzError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthzError::Forbidden => StatusCode::FORBIDDEN,
            AuthzError::RoleNotFound(_) => StatusCode::NOT_FOUND,
            AuthzError::DuplicateRole(_) => StatusCode::CONFLICT,
            AuthzError::InvalidPermissions(_)
            | AuthzError::InvalidUser(_)
            | AuthzError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthzError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "authorization request failed");
        }
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthzError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthzError::RoleNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthzError::InvalidPermissions("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthzError::DuplicateRole("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthzError::Storage(GateError::Other("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_message() {
        assert_eq!(AuthzError::Forbidden.to_string(), "Access denied");
    }
}
