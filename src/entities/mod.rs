pub mod role;
pub mod session;
pub mod user_role;

pub use role::Entity as Role;
pub use session::Entity as Session;
pub use user_role::Entity as UserRole;
