use std::sync::Arc;

use crate::authz::errors::AuthzError;
use crate::authz::store::{AuthzResult, MemoryStore, RoleStore, UserRoleIndex};
use crate::authz::types::{NewRole, PermissionSet, Role, UserRoleAssignment};

/// Authorization decisions over an injected role store and assignment index.
///
/// Checks take `&self` and keep no scratch state, so one `Authorizer` can be
/// cloned into any number of concurrent tasks.
#[derive(Clone)]
pub struct Authorizer {
    roles: Arc<dyn RoleStore>,
    assignments: Arc<dyn UserRoleIndex>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}

impl Authorizer {
    pub fn new(roles: Arc<dyn RoleStore>, assignments: Arc<dyn UserRoleIndex>) -> Self {
        Self { roles, assignments }
    }

    /// Use one store as both role store and assignment index.
    pub fn with_store<S>(store: S) -> Self
    where
        S: RoleStore + UserRoleIndex + 'static,
    {
        let store = Arc::new(store);
        Self {
            roles: store.clone(),
            assignments: store,
        }
    }

    /// An isolated, non-durable instance.
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// True when the role holds every requested permission.
    ///
    /// An empty request is always granted, even without a role. A missing or
    /// unknown role denies.
    pub async fn role_can(
        &self,
        permissions: impl Into<PermissionSet>,
        role_id: Option<&str>,
    ) -> AuthzResult<bool> {
        let permissions = permissions.into();
        self.role_can_set(&permissions, role_id).await
    }

    async fn role_can_set(
        &self,
        permissions: &PermissionSet,
        role_id: Option<&str>,
    ) -> AuthzResult<bool> {
        if permissions.is_empty() {
            return Ok(true);
        }

        let Some(role_id) = role_id else {
            return Ok(false);
        };

        // A role deleted concurrently simply reads as missing
        let Some(role) = self.roles.find_role(role_id).await? else {
            tracing::debug!(role_id, "role not found, denying");
            return Ok(false);
        };

        Ok(permissions.is_subset(&role.permissions))
    }

    /// True when the user's assigned role holds every requested permission.
    ///
    /// An empty request is granted before any lookup. A missing or empty user
    /// id denies instead of failing.
    pub async fn user_can(
        &self,
        permissions: impl Into<PermissionSet>,
        user_id: Option<&str>,
    ) -> AuthzResult<bool> {
        let permissions = permissions.into();
        if permissions.is_empty() {
            return Ok(true);
        }

        let user_id = match user_id {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(false),
        };

        let role_id = self.assignments.role_of(user_id).await?;
        self.role_can_set(&permissions, role_id.as_deref()).await
    }

    /// Like [`Authorizer::role_can`] but a denial is an `AuthzError::Forbidden`.
    pub async fn check_role_perms(
        &self,
        permissions: impl Into<PermissionSet>,
        role_id: Option<&str>,
    ) -> AuthzResult<()> {
        let permissions = permissions.into();
        if self.role_can_set(&permissions, role_id).await? {
            Ok(())
        } else {
            tracing::info!(?role_id, %permissions, "role permission check denied");
            Err(AuthzError::Forbidden)
        }
    }

    /// Like [`Authorizer::user_can`] but a denial is an `AuthzError::Forbidden`.
    pub async fn check_user_perms(
        &self,
        permissions: impl Into<PermissionSet>,
        user_id: Option<&str>,
    ) -> AuthzResult<()> {
        let permissions = permissions.into();
        let requested = permissions.to_string();
        if self.user_can(permissions, user_id).await? {
            Ok(())
        } else {
            tracing::info!(?user_id, permissions = %requested, "user permission check denied");
            Err(AuthzError::Forbidden)
        }
    }

    /// Assign `role_id` to `user_id`, or clear the assignment with `None`.
    ///
    /// The previous assignment is untouched when the role does not exist.
    pub async fn set_user_role(&self, user_id: &str, role_id: Option<&str>) -> AuthzResult<()> {
        if user_id.is_empty() {
            return Err(AuthzError::InvalidUser("user id must not be empty".to_string()));
        }

        if let Some(role_id) = role_id {
            if !self.roles.role_exists(role_id).await? {
                return Err(AuthzError::RoleNotFound(role_id.to_string()));
            }
        }

        self.assignments.assign_role(user_id, role_id).await?;
        tracing::info!(user_id, ?role_id, "user role updated");
        Ok(())
    }

    /// The role id stored for `user_id`, whether or not that role still exists.
    pub async fn role_of(&self, user_id: &str) -> AuthzResult<Option<String>> {
        self.assignments.role_of(user_id).await
    }

    /// The role record of `user_id`. Stale assignments read as no role.
    pub async fn current_role(&self, user_id: Option<&str>) -> AuthzResult<Option<Role>> {
        let user_id = match user_id {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };
        match self.assignments.role_of(user_id).await? {
            Some(role_id) => self.roles.find_role(&role_id).await,
            None => Ok(None),
        }
    }

    pub async fn current_role_id(&self, user_id: Option<&str>) -> AuthzResult<Option<String>> {
        Ok(self.current_role(user_id).await?.map(|role| role.id))
    }

    pub async fn create_role(&self, new_role: NewRole) -> AuthzResult<Role> {
        let role = self.roles.create_role(new_role).await?;
        tracing::info!(role_id = %role.id, permissions = %role.permissions, "role created");
        Ok(role)
    }

    pub async fn delete_role(&self, role_id: &str) -> AuthzResult<()> {
        self.roles.delete_role(role_id).await?;
        tracing::info!(role_id, "role deleted");
        Ok(())
    }

    pub async fn find_role(&self, role_id: &str) -> AuthzResult<Option<Role>> {
        self.roles.find_role(role_id).await
    }

    pub async fn list_roles(&self) -> AuthzResult<Vec<Role>> {
        self.roles.list_roles().await
    }

    /// The stored assignment record of `user_id`, if one was ever written.
    pub async fn assignment(&self, user_id: &str) -> AuthzResult<Option<UserRoleAssignment>> {
        self.assignments.assignment(user_id).await
    }
}
