//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and session token handling for all three roles.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{decode_token, hash_password, AuthService};
