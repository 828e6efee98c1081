//! In-process collection, used for tests and `serve --in-memory`

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{StoreError, UserCollection, UserFilter, UserUpdate};
use crate::account::types::{Email, UserEntry, UserId};

#[derive(Default)]
struct Collection {
    users: HashMap<UserId, UserEntry>,
    by_email: HashMap<Email, UserId>,
}

impl Collection {
    fn resolve(&self, filter: &UserFilter) -> Option<UserId> {
        match filter {
            UserFilter::Id(id) => self.users.contains_key(id).then(|| id.clone()),
            UserFilter::Email(email) => self.by_email.get(email).cloned(),
        }
    }
}

#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<Collection>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().map(|c| c.users.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collection>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("collection lock poisoned".to_string()))
    }
}

impl UserCollection for MemoryCollection {
    fn find_one(&self, filter: &UserFilter) -> Result<Option<UserEntry>, StoreError> {
        let collection = self.lock()?;
        Ok(collection
            .resolve(filter)
            .and_then(|id| collection.users.get(&id).cloned()))
    }

    fn insert(&self, entry: &UserEntry) -> Result<(), StoreError> {
        let mut collection = self.lock()?;

        if collection.users.contains_key(&entry.id) {
            return Err(StoreError::DuplicateKey("id"));
        }
        if collection.by_email.contains_key(&entry.email) {
            return Err(StoreError::DuplicateKey("email"));
        }

        collection.by_email.insert(entry.email.clone(), entry.id.clone());
        collection.users.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn update(&self, filter: &UserFilter, fields: &UserUpdate) -> Result<(), StoreError> {
        let mut collection = self.lock()?;
        let id = collection.resolve(filter).ok_or(StoreError::NotFound)?;

        let mut entry = collection.users.get(&id).cloned().ok_or(StoreError::NotFound)?;
        let old_email = entry.email.clone();
        fields.apply(&mut entry);

        if entry.email != old_email {
            if collection.by_email.contains_key(&entry.email) {
                return Err(StoreError::DuplicateKey("email"));
            }
            collection.by_email.remove(&old_email);
            collection.by_email.insert(entry.email.clone(), id.clone());
        }

        collection.users.insert(id, entry);
        Ok(())
    }

    fn remove(&self, filter: &UserFilter) -> Result<(), StoreError> {
        let mut collection = self.lock()?;
        let id = collection.resolve(filter).ok_or(StoreError::NotFound)?;

        if let Some(entry) = collection.users.remove(&id) {
            collection.by_email.remove(&entry.email);
        }
        Ok(())
    }
}
