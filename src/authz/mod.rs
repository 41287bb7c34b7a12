pub mod engine;
pub mod errors;
pub mod identity;
pub mod store;
pub mod types;
pub mod web;

pub use engine::Authorizer;
pub use errors::AuthzError;
pub use identity::{IdentityProvider, SessionIdentity};
pub use store::{DbStore, MemoryStore, RoleStore, UserRoleIndex};
pub use types::{NewRole, PermissionSet, Role, UserRoleAssignment};
