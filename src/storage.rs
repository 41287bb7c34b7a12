use crate::authz::types::{PermissionSet, Role, UserRoleAssignment};
use crate::entities;
use crate::errors::GateError;
use crate::settings::Database as DbCfg;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub subject: String,
    pub created_at: i64,
    pub expires_at: i64,
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, GateError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

pub fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

fn role_from_model(model: entities::role::Model) -> Result<Role, GateError> {
    let permissions: PermissionSet = serde_json::from_str(&model.permissions)?;
    Ok(Role {
        id: model.role_id,
        permissions,
    })
}

// Role functions

/// Insert a new role row. Ids of soft-deleted roles stay in the table, so the
/// primary key also rejects reuse of a retired id.
pub async fn create_role(
    db: &DatabaseConnection,
    role_id: &str,
    permissions: &PermissionSet,
) -> Result<Role, GateError> {
    let created_at = Utc::now().timestamp();
    let permissions_json = serde_json::to_string(permissions)?;

    let role = entities::role::ActiveModel {
        role_id: Set(role_id.to_string()),
        permissions: Set(permissions_json),
        created_at: Set(created_at),
        deleted_at: Set(None),
    };

    role.insert(db).await?;

    Ok(Role {
        id: role_id.to_string(),
        permissions: permissions.clone(),
    })
}

pub async fn get_role(db: &DatabaseConnection, role_id: &str) -> Result<Option<Role>, GateError> {
    use entities::role::{Column, Entity};

    if let Some(model) = Entity::find()
        .filter(Column::RoleId.eq(role_id))
        .filter(Column::DeletedAt.is_null())
        .one(db)
        .await?
    {
        Ok(Some(role_from_model(model)?))
    } else {
        Ok(None)
    }
}

pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<Role>, GateError> {
    use entities::role::{Column, Entity};

    Entity::find()
        .filter(Column::DeletedAt.is_null())
        .order_by_asc(Column::RoleId)
        .all(db)
        .await?
        .into_iter()
        .map(role_from_model)
        .collect()
}

/// Soft-delete a role. Returns false when no live role had this id.
pub async fn delete_role(db: &DatabaseConnection, role_id: &str) -> Result<bool, GateError> {
    use entities::role::{Column, Entity};

    let now = Utc::now().timestamp();
    let result = Entity::update_many()
        .col_expr(Column::DeletedAt, Expr::value(now))
        .filter(Column::RoleId.eq(role_id))
        .filter(Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

// User role assignment functions

pub async fn get_user_role(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<UserRoleAssignment>, GateError> {
    use entities::user_role::Entity;

    Ok(Entity::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .map(|model| UserRoleAssignment {
            user_id: model.user_id,
            role_id: model.role_id,
        }))
}

/// Replace the assignment for `user_id` with a single upsert statement.
pub async fn set_user_role(
    db: &DatabaseConnection,
    user_id: &str,
    role_id: Option<&str>,
) -> Result<(), GateError> {
    use entities::user_role::{Column, Entity};

    let now = Utc::now().timestamp();

    let assignment = entities::user_role::ActiveModel {
        user_id: Set(user_id.to_string()),
        role_id: Set(role_id.map(str::to_string)),
        updated_at: Set(now),
    };

    Entity::insert(assignment)
        .on_conflict(
            OnConflict::column(Column::UserId)
                .update_columns([Column::RoleId, Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

// Session management functions

pub async fn create_session(
    db: &DatabaseConnection,
    subject: &str,
    ttl_secs: i64,
) -> Result<Session, GateError> {
    let session_id = random_id();
    let now = Utc::now().timestamp();
    let expires_at = now
        .checked_add(ttl_secs)
        .ok_or_else(|| GateError::Other(format!("session ttl of {ttl_secs}s is out of range")))?;

    let session = entities::session::ActiveModel {
        session_id: Set(session_id.clone()),
        subject: Set(subject.to_string()),
        created_at: Set(now),
        expires_at: Set(expires_at),
    };

    session.insert(db).await?;

    Ok(Session {
        session_id,
        subject: subject.to_string(),
        created_at: now,
        expires_at,
    })
}

pub async fn get_session(
    db: &DatabaseConnection,
    session_id: &str,
) -> Result<Option<Session>, GateError> {
    use entities::session::{Column, Entity};

    if let Some(model) = Entity::find()
        .filter(Column::SessionId.eq(session_id))
        .one(db)
        .await?
    {
        // Check if session is expired
        let now = Utc::now().timestamp();
        if now > model.expires_at {
            return Ok(None);
        }

        Ok(Some(Session {
            session_id: model.session_id,
            subject: model.subject,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }))
    } else {
        Ok(None)
    }
}

pub async fn delete_session(db: &DatabaseConnection, session_id: &str) -> Result<bool, GateError> {
    use entities::session::{Column, Entity};

    let result = Entity::delete_many()
        .filter(Column::SessionId.eq(session_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

pub async fn cleanup_expired_sessions(db: &DatabaseConnection) -> Result<u64, GateError> {
    use entities::session::{Column, Entity};

    let now = Utc::now().timestamp();
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lt(now))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
