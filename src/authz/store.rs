//! Storage seams of the decision engine.
//!
//! [`RoleStore`] owns role records, [`UserRoleIndex`] owns the user -> role
//! mapping. The engine only sees these traits, so every [`Authorizer`] gets its
//! own injected store instances.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: `HashMap`s behind a `tokio::sync::RwLock`, not durable.
//! - [`DbStore`]: sea-orm tables created by the `migration` crate.
//!
//! Both implement both traits, so one instance can be handed to the engine as
//! role store and assignment index at once.
//!
//! [`Authorizer`]: crate::authz::engine::Authorizer
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, SqlErr};
use tokio::sync::RwLock;

use crate::authz::errors::AuthzError;
use crate::authz::types::{NewRole, PermissionSet, Role, UserRoleAssignment};
use crate::errors::GateError;
use crate::storage;

pub type AuthzResult<T> = Result<T, AuthzError>;

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Create a role. Fails with `DuplicateRole` when the id is live or was
    /// used by a deleted role.
    async fn create_role(&self, new_role: NewRole) -> AuthzResult<Role>;

    /// Look up a live role. Not-found is `Ok(None)`, never an error.
    async fn find_role(&self, role_id: &str) -> AuthzResult<Option<Role>>;

    async fn role_exists(&self, role_id: &str) -> AuthzResult<bool> {
        Ok(self.find_role(role_id).await?.is_some())
    }

    async fn list_roles(&self) -> AuthzResult<Vec<Role>>;

    /// Delete a role. Assignments pointing at it are left as they are.
    async fn delete_role(&self, role_id: &str) -> AuthzResult<()>;
}

#[async_trait]
pub trait UserRoleIndex: Send + Sync {
    /// The stored record for `user_id`, if one was ever written.
    async fn assignment(&self, user_id: &str) -> AuthzResult<Option<UserRoleAssignment>>;

    /// The assigned role id. A missing record and an explicit `None`
    /// assignment both read as `None`.
    async fn role_of(&self, user_id: &str) -> AuthzResult<Option<String>> {
        Ok(self
            .assignment(user_id)
            .await?
            .and_then(|assignment| assignment.role_id))
    }

    /// Replace the assignment for `user_id` in one step. Fails with
    /// `RoleNotFound` when `role_id` names no live role of this backend; the
    /// prior assignment is then left as it was.
    async fn assign_role(&self, user_id: &str, role_id: Option<&str>) -> AuthzResult<()>;
}

fn resolve_role_id(new_role: &NewRole) -> AuthzResult<String> {
    match &new_role.id {
        Some(id) if id.is_empty() => Err(AuthzError::InvalidRequest(
            "role id must not be empty".to_string(),
        )),
        Some(id) => Ok(id.clone()),
        None => Ok(storage::random_id()),
    }
}

// ---------- In-memory backend ----------

#[derive(Debug, Default)]
struct MemoryState {
    roles: HashMap<String, PermissionSet>,
    /// Ids of deleted roles; never handed out again
    retired: HashSet<String>,
    assignments: HashMap<String, Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn create_role(&self, new_role: NewRole) -> AuthzResult<Role> {
        let id = resolve_role_id(&new_role)?;
        let mut state = self.state.write().await;
        if state.roles.contains_key(&id) || state.retired.contains(&id) {
            return Err(AuthzError::DuplicateRole(id));
        }
        state.roles.insert(id.clone(), new_role.permissions.clone());
        Ok(Role {
            id,
            permissions: new_role.permissions,
        })
    }

    async fn find_role(&self, role_id: &str) -> AuthzResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.get(role_id).map(|permissions| Role {
            id: role_id.to_string(),
            permissions: permissions.clone(),
        }))
    }

    async fn list_roles(&self) -> AuthzResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .map(|(id, permissions)| Role {
                id: id.clone(),
                permissions: permissions.clone(),
            })
            .collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roles)
    }

    async fn delete_role(&self, role_id: &str) -> AuthzResult<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(role_id).is_none() {
            return Err(AuthzError::RoleNotFound(role_id.to_string()));
        }
        state.retired.insert(role_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl UserRoleIndex for MemoryStore {
    async fn assignment(&self, user_id: &str) -> AuthzResult<Option<UserRoleAssignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .get(user_id)
            .map(|role_id| UserRoleAssignment {
                user_id: user_id.to_string(),
                role_id: role_id.clone(),
            }))
    }

    async fn assign_role(&self, user_id: &str, role_id: Option<&str>) -> AuthzResult<()> {
        let mut state = self.state.write().await;
        if let Some(role_id) = role_id {
            if !state.roles.contains_key(role_id) {
                return Err(AuthzError::RoleNotFound(role_id.to_string()));
            }
        }
        state
            .assignments
            .insert(user_id.to_string(), role_id.map(str::to_string));
        Ok(())
    }
}

// ---------- SQL backend ----------

#[derive(Debug, Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleStore for DbStore {
    async fn create_role(&self, new_role: NewRole) -> AuthzResult<Role> {
        let id = resolve_role_id(&new_role)?;
        match storage::create_role(&self.db, &id, &new_role.permissions).await {
            Ok(role) => Ok(role),
            Err(GateError::Db(err))
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Err(AuthzError::DuplicateRole(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_role(&self, role_id: &str) -> AuthzResult<Option<Role>> {
        Ok(storage::get_role(&self.db, role_id).await?)
    }

    async fn list_roles(&self) -> AuthzResult<Vec<Role>> {
        Ok(storage::list_roles(&self.db).await?)
    }

    async fn delete_role(&self, role_id: &str) -> AuthzResult<()> {
        if storage::delete_role(&self.db, role_id).await? {
            Ok(())
        } else {
            Err(AuthzError::RoleNotFound(role_id.to_string()))
        }
    }
}

#[async_trait]
impl UserRoleIndex for DbStore {
    async fn assignment(&self, user_id: &str) -> AuthzResult<Option<UserRoleAssignment>> {
        Ok(storage::get_user_role(&self.db, user_id).await?)
    }

    async fn assign_role(&self, user_id: &str, role_id: Option<&str>) -> AuthzResult<()> {
        if let Some(role_id) = role_id {
            if storage::get_role(&self.db, role_id).await?.is_none() {
                return Err(AuthzError::RoleNotFound(role_id.to_string()));
            }
        }
        Ok(storage::set_user_role(&self.db, user_id, role_id).await?)
    }
}
