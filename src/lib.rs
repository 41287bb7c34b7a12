//! Rolegate - role-based access control
//!
//! Each user holds at most one role, each role a set of permission strings.
//! [`authz::Authorizer`] answers "may this user/role do all of these things"
//! over injected stores; the rest of the crate wires it to SQL storage, HTTP
//! and an admin GraphQL API.

pub mod admin_graphql;
pub mod admin_mutations;
pub mod authz;
pub mod entities;
pub mod errors;
pub mod jobs;
pub mod session;
pub mod settings;
pub mod storage;
pub mod web;
