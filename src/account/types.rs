//! Account type definitions

use serde::{Deserialize, Serialize};

/// User identifier - opaque token assigned at creation
pub type UserId = String;

/// Display name
pub type Name = String;

/// Email address, unique across all live entries
pub type Email = String;

/// Plaintext password as received from the caller. Never persisted.
pub type Password = String;

/// Base64 encoded random salt
pub type PasswordSalt = String;

/// Base64 encoded Argon2id output
pub type PasswordHash = String;

/// Persisted user record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    // Identity
    pub id: UserId,
    pub name: Name,
    pub email: Email,

    // Authentication
    pub password_salt: PasswordSalt,
    pub password_hash: PasswordHash,
}

// Operation arguments and replies

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateArgs {
    pub name: Name,
    pub email: Email,
    pub password: Password,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CreateReply {
    pub id: UserId,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DestroyArgs {
    pub id: UserId,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DestroyReply {}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct QueryArgs {
    pub id: UserId,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct QueryReply {
    pub name: Name,
    pub email: Email,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct QueryByEmailArgs {
    pub email: Email,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct QueryByEmailReply {
    pub id: UserId,
    pub name: Name,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginArgs {
    pub id: UserId,
    pub password: Password,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoginReply {
    pub name: Name,
    pub email: Email,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginByEmailArgs {
    pub email: Email,
    pub password: Password,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoginByEmailReply {
    pub id: UserId,
    pub name: Name,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UpdateNameArgs {
    pub id: UserId,
    pub name: Name,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct UpdateNameReply {}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UpdatePasswordArgs {
    pub id: UserId,
    pub password: Password,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct UpdatePasswordReply {}
