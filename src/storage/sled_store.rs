//! Embedded document store backed by sled.
//!
//! Each namespace owns two trees: `<ns>.users` maps id to a bincode-encoded
//! `UserEntry`, `<ns>.users_by_email` maps email to id. Writes go through a
//! transaction spanning both trees so the email index always matches the
//! primary records.

use serde::{Deserialize, Serialize};
use sled::transaction::{
    abort, ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::{Db, IVec, Transactional, Tree};
use tracing::{debug, info};

use super::{StoreError, UserCollection, UserFilter, UserUpdate};
use crate::account::types::UserEntry;
use crate::config::StoreConfig;

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => e.into(),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode<T: for<'a> Deserialize<'a>>(data: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(data).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn tx_decode(data: &[u8]) -> ConflictableTransactionResult<UserEntry, StoreError> {
    decode(data).map_err(ConflictableTransactionError::Abort)
}

/// Look up the id a filter points at, inside a transaction
fn tx_resolve(
    users: &TransactionalTree,
    emails: &TransactionalTree,
    filter: &UserFilter,
) -> ConflictableTransactionResult<Option<IVec>, StoreError> {
    match filter {
        UserFilter::Id(id) => Ok(users.get(id.as_bytes())?.map(|_| IVec::from(id.as_bytes()))),
        UserFilter::Email(email) => Ok(emails.get(email.as_bytes())?),
    }
}

pub struct SledCollection {
    db: Db,
    users: Tree,
    emails: Tree,
}

impl SledCollection {
    /// Open (or create) the store described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .path(&config.path)
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        info!("User store opened at {} (namespace '{}')", config.path, config.namespace);
        Self::with_db(db, &config.namespace)
    }

    /// Throwaway store that is deleted when dropped
    pub fn temporary(namespace: &str) -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db, namespace)
    }

    fn with_db(db: Db, namespace: &str) -> Result<Self, StoreError> {
        let users = db.open_tree(format!("{}.users", namespace))?;
        let emails = db.open_tree(format!("{}.users_by_email", namespace))?;
        Ok(Self { db, users, emails })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        let bytes = self.db.flush()?;
        debug!("User store flushed {} bytes", bytes);
        Ok(())
    }

    /// Flush pending writes and release the store
    pub fn close(self) -> Result<(), StoreError> {
        self.flush()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserCollection for SledCollection {
    fn find_one(&self, filter: &UserFilter) -> Result<Option<UserEntry>, StoreError> {
        let id = match filter {
            UserFilter::Id(id) => IVec::from(id.as_bytes()),
            UserFilter::Email(email) => match self.emails.get(email.as_bytes())? {
                Some(id) => id,
                None => return Ok(None),
            },
        };

        match self.users.get(&id)? {
            Some(data) => Ok(Some(decode(&data)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, entry: &UserEntry) -> Result<(), StoreError> {
        let data = encode(entry)?;

        (&self.users, &self.emails).transaction(|(users, emails)| {
            if users.get(entry.id.as_bytes())?.is_some() {
                return abort(StoreError::DuplicateKey("id"));
            }
            if emails.get(entry.email.as_bytes())?.is_some() {
                return abort(StoreError::DuplicateKey("email"));
            }

            users.insert(entry.id.as_bytes(), data.as_slice())?;
            emails.insert(entry.email.as_bytes(), entry.id.as_bytes())?;
            Ok(())
        })?;

        Ok(())
    }

    fn update(&self, filter: &UserFilter, fields: &UserUpdate) -> Result<(), StoreError> {
        (&self.users, &self.emails).transaction(|(users, emails)| {
            let id = match tx_resolve(users, emails, filter)? {
                Some(id) => id,
                None => return abort(StoreError::NotFound),
            };
            let mut entry = match users.get(&id)? {
                Some(data) => tx_decode(&data)?,
                None => return abort(StoreError::NotFound),
            };

            let old_email = entry.email.clone();
            fields.apply(&mut entry);

            if entry.email != old_email {
                if emails.get(entry.email.as_bytes())?.is_some() {
                    return abort(StoreError::DuplicateKey("email"));
                }
                emails.remove(old_email.as_bytes())?;
                emails.insert(entry.email.as_bytes(), id.clone())?;
            }

            let data = encode(&entry).map_err(ConflictableTransactionError::Abort)?;
            users.insert(id, data)?;
            Ok(())
        })?;

        Ok(())
    }

    fn remove(&self, filter: &UserFilter) -> Result<(), StoreError> {
        (&self.users, &self.emails).transaction(|(users, emails)| {
            let id = match tx_resolve(users, emails, filter)? {
                Some(id) => id,
                None => return abort(StoreError::NotFound),
            };

            if let Some(data) = users.remove(id.clone())? {
                let entry = tx_decode(&data)?;
                emails.remove(entry.email.as_bytes())?;
            }
            Ok(())
        })?;

        Ok(())
    }
}
