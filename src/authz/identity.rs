//! Resolution of the calling identity for session-scoped endpoints.
//!
//! Handlers resolve the identity once and pass the id to the engine
//! explicitly; the engine itself never looks up a "current user".
use async_trait::async_trait;
use axum::http::HeaderMap;
use sea_orm::DatabaseConnection;

use crate::authz::store::AuthzResult;
use crate::session::SessionCookie;
use crate::storage;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user id behind the request, or `None` for anonymous callers.
    async fn current_user_id(&self, headers: &HeaderMap) -> AuthzResult<Option<String>>;
}

/// Resolves the `rolegate_session` cookie through the `sessions` table.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    db: DatabaseConnection,
}

impl SessionIdentity {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_user_id(&self, headers: &HeaderMap) -> AuthzResult<Option<String>> {
        let Some(cookie) = SessionCookie::from_headers(headers) else {
            return Ok(None);
        };
        let session = storage::get_session(&self.db, &cookie.session_id).await?;
        Ok(session.map(|s| s.subject))
    }
}
