#![allow(dead_code)]

pub mod db;
pub mod http;

#[allow(unused_imports)]
pub use db::{seed_role, start_session, TestDb};
#[allow(unused_imports)]
pub use http::{get, post_json, read_json};
