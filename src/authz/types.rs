use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_set;
use std::collections::BTreeSet;

use crate::authz::errors::AuthzError;

/// A set of exact, case-sensitive permission tokens.
///
/// Every entry point that accepts permissions normalizes into this type, so a
/// single permission and a list of permissions share one code path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a JSON value: a string becomes a singleton set, an array must
    /// contain only strings. Anything else is rejected.
    pub fn from_json(value: &Value) -> Result<Self, AuthzError> {
        match value {
            Value::String(s) => Ok(Self::from(s.as_str())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(AuthzError::InvalidPermissions(format!(
                        "expected a string inside the permissions array, got `{other}`"
                    ))),
                })
                .collect(),
            other => Err(AuthzError::InvalidPermissions(format!(
                "permissions must be a string or an array of strings, got `{other}`"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every permission of `self` is also in `granted`.
    pub fn is_subset(&self, granted: &PermissionSet) -> bool {
        self.0.is_subset(&granted.0)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl std::fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, perm) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{perm}")?;
        }
        write!(f, "]")
    }
}

impl From<&str> for PermissionSet {
    fn from(permission: &str) -> Self {
        Self(BTreeSet::from([permission.to_string()]))
    }
}

impl From<String> for PermissionSet {
    fn from(permission: String) -> Self {
        Self(BTreeSet::from([permission]))
    }
}

impl From<&[&str]> for PermissionSet {
    fn from(permissions: &[&str]) -> Self {
        permissions.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for PermissionSet {
    fn from(permissions: [&str; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<Vec<String>> for PermissionSet {
    fn from(permissions: Vec<String>) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<Vec<&str>> for PermissionSet {
    fn from(permissions: Vec<&str>) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<BTreeSet<String>> for PermissionSet {
    fn from(permissions: BTreeSet<String>) -> Self {
        Self(permissions)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------- Domain types ----------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Default)]
pub struct NewRole {
    /// Caller-chosen id; a random one is generated when absent
    pub id: Option<String>,
    pub permissions: PermissionSet,
}

impl NewRole {
    pub fn new(id: impl Into<String>, permissions: impl Into<PermissionSet>) -> Self {
        Self {
            id: Some(id.into()),
            permissions: permissions.into(),
        }
    }
}

/// The stored user -> role mapping, limited to the role-id field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub user_id: String,
    pub role_id: Option<String>,
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// e.g. "u1"; mutually exclusive with `role_id`
    #[serde(default)]
    pub user_id: Option<String>,
    /// e.g. "editor"
    #[serde(default)]
    pub role_id: Option<String>,
    /// A string or an array of strings
    #[serde(default)]
    pub permissions: Value,
}

#[derive(Debug, Deserialize)]
pub struct CanRequest {
    /// A string or an array of strings
    #[serde(default)]
    pub permissions: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

/// The caller's own role and assignment record. Both fields are omitted when
/// the caller is anonymous.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MyRoleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<UserRoleAssignment>,
}
