use async_graphql::*;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::authz::{AuthzError, Authorizer, NewRole, PermissionSet, Role, UserRoleAssignment};
use crate::jobs;
use crate::session::SessionCookie;
use crate::settings::Session as SessionCfg;
use crate::storage;

/// Longest session the admin API will issue (one year)
const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

fn gql_error(err: AuthzError) -> Error {
    let code = match &err {
        AuthzError::Forbidden => "FORBIDDEN",
        AuthzError::RoleNotFound(_) => "ROLE_NOT_FOUND",
        AuthzError::InvalidPermissions(_) => "INVALID_PERMISSIONS",
        AuthzError::DuplicateRole(_) => "DUPLICATE_ROLE",
        AuthzError::InvalidUser(_) | AuthzError::InvalidRequest(_) => "BAD_REQUEST",
        AuthzError::Storage(_) => "INTERNAL",
    };
    Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

fn authorizer<'a>(ctx: &'a Context<'_>) -> Result<&'a Authorizer> {
    ctx.data::<Authorizer>()
        .map_err(|_| Error::new("Authorizer not available"))
}

fn database<'a>(ctx: &'a Context<'_>) -> Result<&'a Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .map_err(|_| Error::new("Database connection not available"))
}

/// A role and its permissions
#[derive(SimpleObject)]
pub struct RoleInfo {
    pub id: String,
    pub permissions: Vec<String>,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            permissions: role.permissions.to_vec(),
        }
    }
}

/// A user's stored role assignment
#[derive(SimpleObject)]
pub struct UserRoleInfo {
    pub user_id: String,
    pub role_id: Option<String>,
}

impl From<UserRoleAssignment> for UserRoleInfo {
    fn from(assignment: UserRoleAssignment) -> Self {
        Self {
            user_id: assignment.user_id,
            role_id: assignment.role_id,
        }
    }
}

/// A session issued for a user
#[derive(SimpleObject)]
pub struct IssuedSession {
    pub session_id: String,
    pub user_id: String,
    pub expires_at: i64,
    /// Ready-to-send `Set-Cookie` value
    pub cookie: String,
}

/// Result of triggering a job
#[derive(SimpleObject)]
pub struct JobTriggerResult {
    pub success: bool,
    pub message: String,
    pub job_name: String,
    pub records_processed: Option<i64>,
}

/// Information about an available job
#[derive(SimpleObject)]
pub struct JobInfo {
    pub name: String,
    pub description: String,
    pub schedule: String,
}

/// Custom queries for admin operations
#[derive(Default)]
pub struct AdminQuery;

#[Object]
impl AdminQuery {
    /// All live roles, ordered by id
    async fn roles(&self, ctx: &Context<'_>) -> Result<Vec<RoleInfo>> {
        let roles = authorizer(ctx)?.list_roles().await.map_err(gql_error)?;
        Ok(roles.into_iter().map(RoleInfo::from).collect())
    }

    /// A single role, or null when it does not exist
    async fn role(&self, ctx: &Context<'_>, id: String) -> Result<Option<RoleInfo>> {
        let role = authorizer(ctx)?.find_role(&id).await.map_err(gql_error)?;
        Ok(role.map(RoleInfo::from))
    }

    /// The stored assignment of a user, or null when none was ever written
    async fn user_role(&self, ctx: &Context<'_>, user_id: String) -> Result<Option<UserRoleInfo>> {
        let assignment = authorizer(ctx)?
            .assignment(&user_id)
            .await
            .map_err(gql_error)?;
        Ok(assignment.map(UserRoleInfo::from))
    }

    /// Evaluate a permission check for a user
    async fn user_can(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        permissions: Vec<String>,
    ) -> Result<bool> {
        authorizer(ctx)?
            .user_can(PermissionSet::from(permissions), Some(user_id.as_str()))
            .await
            .map_err(gql_error)
    }

    /// Get list of available jobs that can be triggered
    async fn available_jobs(&self) -> Result<Vec<JobInfo>> {
        Ok(vec![JobInfo {
            name: jobs::CLEANUP_EXPIRED_SESSIONS.to_string(),
            description: "Clean up expired sessions".to_string(),
            schedule: "Hourly at :00".to_string(),
        }])
    }
}

/// Custom mutations for admin operations
#[derive(Default)]
pub struct AdminMutation;

#[Object]
impl AdminMutation {
    /// Create a role; a random id is generated when `id` is omitted
    async fn create_role(
        &self,
        ctx: &Context<'_>,
        id: Option<String>,
        #[graphql(default)] permissions: Vec<String>,
    ) -> Result<RoleInfo> {
        let role = authorizer(ctx)?
            .create_role(NewRole {
                id,
                permissions: PermissionSet::from(permissions),
            })
            .await
            .map_err(gql_error)?;
        Ok(role.into())
    }

    /// Delete a role. Users assigned to it lose its permissions.
    async fn delete_role(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        authorizer(ctx)?.delete_role(&id).await.map_err(gql_error)?;
        Ok(true)
    }

    /// Assign a role to a user, or clear the assignment with a null role
    async fn set_user_role(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        role_id: Option<String>,
    ) -> Result<UserRoleInfo> {
        authorizer(ctx)?
            .set_user_role(&user_id, role_id.as_deref())
            .await
            .map_err(gql_error)?;
        Ok(UserRoleInfo { user_id, role_id })
    }

    /// Issue a session for a user authenticated elsewhere
    async fn issue_session(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        ttl_secs: Option<i64>,
    ) -> Result<IssuedSession> {
        if user_id.is_empty() {
            return Err(gql_error(AuthzError::InvalidUser(
                "user id must not be empty".to_string(),
            )));
        }
        let db = database(ctx)?;
        let cfg = ctx
            .data::<SessionCfg>()
            .map_err(|_| Error::new("Session settings not available"))?;
        let ttl = ttl_secs.unwrap_or(cfg.ttl_secs);
        if !(1..=MAX_SESSION_TTL_SECS).contains(&ttl) {
            return Err(gql_error(AuthzError::InvalidRequest(format!(
                "ttlSecs must be between 1 and {MAX_SESSION_TTL_SECS}"
            ))));
        }

        let session = storage::create_session(db.as_ref(), &user_id, ttl)
            .await
            .map_err(|e| gql_error(e.into()))?;
        tracing::info!(user_id = %user_id, expires_at = session.expires_at, "session issued");

        let cookie = SessionCookie::new(session.session_id.clone())
            .to_cookie_header(cfg.cookie_secure, ttl);
        Ok(IssuedSession {
            session_id: session.session_id,
            user_id,
            expires_at: session.expires_at,
            cookie,
        })
    }

    /// Revoke a session; returns false when it did not exist
    async fn revoke_session(&self, ctx: &Context<'_>, session_id: String) -> Result<bool> {
        let db = database(ctx)?;
        storage::delete_session(db.as_ref(), &session_id)
            .await
            .map_err(|e| gql_error(e.into()))
    }

    /// Manually trigger a background job by name
    async fn trigger_job(&self, ctx: &Context<'_>, job_name: String) -> Result<JobTriggerResult> {
        let db = database(ctx)?;

        match jobs::trigger_job_manually(db.as_ref(), &job_name).await {
            Ok(count) => Ok(JobTriggerResult {
                success: true,
                message: format!("Job '{}' triggered successfully", job_name),
                job_name,
                records_processed: Some(count as i64),
            }),
            Err(e) => Ok(JobTriggerResult {
                success: false,
                message: format!("Failed to trigger job '{}': {}", job_name, e),
                job_name,
                records_processed: None,
            }),
        }
    }
}
