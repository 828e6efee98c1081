//! Account lifecycle and authentication
//!
//! This module implements the user account core:
//! - Typed user records and per-operation request/reply shapes
//! - Argon2id password hashing with per-password salts
//! - A stateless service exposing create/destroy/query/login/update

pub mod types;
pub mod auth;
pub mod service;

pub use types::{UserEntry, UserId};
pub use auth::{AuthError, CredentialHasher};
pub use service::AccountService;
