//! Persistence adapter for user records.
//!
//! A `UserCollection` is a document collection keyed by user id with a
//! separate unique index on email. Every operation touches a single record;
//! nothing here spans documents, so callers must not assume a lock is held
//! between a `find_one` and a later `update`/`remove`.

pub mod memory;
pub mod sled_store;

use thiserror::Error;

use crate::account::types::{Email, Name, PasswordHash, PasswordSalt, UserEntry, UserId};

pub use memory::MemoryCollection;
pub use sled_store::SledCollection;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("entry not found")]
    NotFound,
    #[error("duplicate key: {0}")]
    DuplicateKey(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Selects a single record by one of its unique keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Id(UserId),
    Email(Email),
}

/// Salt and hash are only ever written together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub salt: PasswordSalt,
    pub hash: PasswordHash,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<Name>,
    pub email: Option<Email>,
    pub credentials: Option<Credentials>,
}

impl UserUpdate {
    pub fn name(name: Name) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn credentials(salt: PasswordSalt, hash: PasswordHash) -> Self {
        Self {
            credentials: Some(Credentials { salt, hash }),
            ..Default::default()
        }
    }

    /// Apply the set fields to an entry
    pub fn apply(&self, entry: &mut UserEntry) {
        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(email) = &self.email {
            entry.email = email.clone();
        }
        if let Some(credentials) = &self.credentials {
            entry.password_salt = credentials.salt.clone();
            entry.password_hash = credentials.hash.clone();
        }
    }
}

/// Document collection holding user entries.
///
/// `insert` fails with `DuplicateKey` if the id or email is taken; `update`
/// and `remove` fail with `NotFound` when nothing matches the filter.
pub trait UserCollection: Send + Sync {
    fn find_one(&self, filter: &UserFilter) -> Result<Option<UserEntry>, StoreError>;

    fn insert(&self, entry: &UserEntry) -> Result<(), StoreError>;

    fn update(&self, filter: &UserFilter, fields: &UserUpdate) -> Result<(), StoreError>;

    fn remove(&self, filter: &UserFilter) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) fn sample_entry(id: &str, email: &str) -> UserEntry {
    UserEntry {
        id: id.to_string(),
        name: "Test".to_string(),
        email: email.to_string(),
        password_salt: "c2FsdHNhbHRzYWx0c2FsdA".to_string(),
        password_hash: "aGFzaA".to_string(),
    }
}

/// Contract checks shared by every collection implementation
#[cfg(test)]
pub(crate) fn check_collection_contract(store: &dyn UserCollection) {
    let alice = sample_entry("id-1", "alice@test");
    store.insert(&alice).unwrap();

    // Lookups by either key
    assert_eq!(store.find_one(&UserFilter::Id("id-1".into())).unwrap(), Some(alice.clone()));
    assert_eq!(store.find_one(&UserFilter::Email("alice@test".into())).unwrap(), Some(alice.clone()));
    assert_eq!(store.find_one(&UserFilter::Id("missing".into())).unwrap(), None);

    // Uniqueness
    assert_eq!(
        store.insert(&sample_entry("id-2", "alice@test")),
        Err(StoreError::DuplicateKey("email"))
    );
    assert_eq!(
        store.insert(&sample_entry("id-1", "other@test")),
        Err(StoreError::DuplicateKey("id"))
    );
    assert_eq!(store.find_one(&UserFilter::Email("other@test".into())).unwrap(), None);

    // Email change keeps the index consistent and refuses collisions
    store.insert(&sample_entry("id-2", "bob@test")).unwrap();
    let collide = UserUpdate {
        email: Some("alice@test".into()),
        ..Default::default()
    };
    assert_eq!(
        store.update(&UserFilter::Id("id-2".into()), &collide),
        Err(StoreError::DuplicateKey("email"))
    );
    assert_eq!(
        store.find_one(&UserFilter::Id("id-2".into())).unwrap().unwrap().email,
        "bob@test"
    );

    let rename_email = UserUpdate {
        email: Some("robert@test".into()),
        ..Default::default()
    };
    store.update(&UserFilter::Id("id-2".into()), &rename_email).unwrap();
    assert_eq!(store.find_one(&UserFilter::Email("bob@test".into())).unwrap(), None);
    assert_eq!(
        store.find_one(&UserFilter::Email("robert@test".into())).unwrap().unwrap().id,
        "id-2"
    );

    // Partial updates touch only their fields
    store
        .update(&UserFilter::Email("alice@test".into()), &UserUpdate::name("Alice".into()))
        .unwrap();
    let updated = store.find_one(&UserFilter::Id("id-1".into())).unwrap().unwrap();
    assert_eq!(updated.name, "Alice");
    assert_eq!(updated.password_hash, alice.password_hash);

    store
        .update(
            &UserFilter::Id("id-1".into()),
            &UserUpdate::credentials("bmV3c2FsdG5ld3NhbHQ".into(), "bmV3aGFzaA".into()),
        )
        .unwrap();
    let updated = store.find_one(&UserFilter::Id("id-1".into())).unwrap().unwrap();
    assert_eq!(updated.password_salt, "bmV3c2FsdG5ld3NhbHQ");
    assert_eq!(updated.password_hash, "bmV3aGFzaA");
    assert_eq!(updated.name, "Alice");

    // Missing targets
    assert_eq!(
        store.update(&UserFilter::Id("missing".into()), &UserUpdate::name("x".into())),
        Err(StoreError::NotFound)
    );
    assert_eq!(
        store.remove(&UserFilter::Email("missing@test".into())),
        Err(StoreError::NotFound)
    );

    // Removal frees both keys
    store.remove(&UserFilter::Id("id-1".into())).unwrap();
    assert_eq!(store.find_one(&UserFilter::Id("id-1".into())).unwrap(), None);
    assert_eq!(store.find_one(&UserFilter::Email("alice@test".into())).unwrap(), None);
    assert_eq!(store.remove(&UserFilter::Id("id-1".into())), Err(StoreError::NotFound));
    store.insert(&sample_entry("id-3", "alice@test")).unwrap();
}
