//! Account lifecycle and authentication operations.
//!
//! `AccountService` is a stateless handler: it borrows a collection, a hasher
//! and the auth settings, and every operation is a single request/reply
//! exchange with the collection. Construct one per call or share one; there
//! is nothing to synchronise.

use tracing::debug;

use super::auth::{generate_id, generate_salt, CredentialHasher};
use super::types::*;
use crate::config::AuthConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{UserCollection, UserFilter, UserUpdate};

fn require(value: &str, field: &'static str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(field));
    }
    Ok(())
}

pub struct AccountService<'a> {
    store: &'a dyn UserCollection,
    hasher: &'a CredentialHasher,
    auth: &'a AuthConfig,
}

impl<'a> AccountService<'a> {
    pub fn new(
        store: &'a dyn UserCollection,
        hasher: &'a CredentialHasher,
        auth: &'a AuthConfig,
    ) -> Self {
        Self { store, hasher, auth }
    }

    /// Create a new user; the id is always generated here
    pub fn create(&self, args: &CreateArgs) -> ServiceResult<CreateReply> {
        require(&args.name, "name")?;
        require(&args.email, "email")?;

        let (password_salt, password_hash) = self.hasher.hash_new(&args.password)?;
        let entry = UserEntry {
            id: generate_id(),
            name: args.name.clone(),
            email: args.email.clone(),
            password_salt,
            password_hash,
        };

        self.store.insert(&entry)?;
        debug!(id = %entry.id, "user created");

        Ok(CreateReply { id: entry.id })
    }

    pub fn destroy(&self, args: &DestroyArgs) -> ServiceResult<DestroyReply> {
        require(&args.id, "id")?;

        self.store.remove(&UserFilter::Id(args.id.clone()))?;
        debug!(id = %args.id, "user destroyed");

        Ok(DestroyReply {})
    }

    pub fn query(&self, args: &QueryArgs) -> ServiceResult<QueryReply> {
        require(&args.id, "id")?;

        let entry = self.find(&UserFilter::Id(args.id.clone()))?;
        Ok(QueryReply {
            name: entry.name,
            email: entry.email,
        })
    }

    pub fn query_by_email(&self, args: &QueryByEmailArgs) -> ServiceResult<QueryByEmailReply> {
        require(&args.email, "email")?;

        let entry = self.find(&UserFilter::Email(args.email.clone()))?;
        Ok(QueryByEmailReply {
            id: entry.id,
            name: entry.name,
        })
    }

    pub fn login(&self, args: &LoginArgs) -> ServiceResult<LoginReply> {
        require(&args.id, "id")?;

        let entry = self.authenticate(&UserFilter::Id(args.id.clone()), &args.password)?;
        Ok(LoginReply {
            name: entry.name,
            email: entry.email,
        })
    }

    pub fn login_by_email(&self, args: &LoginByEmailArgs) -> ServiceResult<LoginByEmailReply> {
        require(&args.email, "email")?;

        let entry = self.authenticate(&UserFilter::Email(args.email.clone()), &args.password)?;
        Ok(LoginByEmailReply {
            id: entry.id,
            name: entry.name,
        })
    }

    pub fn update_name(&self, args: &UpdateNameArgs) -> ServiceResult<UpdateNameReply> {
        require(&args.id, "id")?;
        require(&args.name, "name")?;

        self.store
            .update(&UserFilter::Id(args.id.clone()), &UserUpdate::name(args.name.clone()))?;
        debug!(id = %args.id, "user name updated");

        Ok(UpdateNameReply {})
    }

    /// Replace salt and hash together. The update can still report
    /// `NotFound` if the entry is destroyed after the lookup.
    pub fn update_password(&self, args: &UpdatePasswordArgs) -> ServiceResult<UpdatePasswordReply> {
        require(&args.id, "id")?;

        let filter = UserFilter::Id(args.id.clone());
        let entry = self.find(&filter)?;

        let mut salt = generate_salt();
        while salt == entry.password_salt {
            salt = generate_salt();
        }
        let hash = self.hasher.hash(&args.password, &salt)?;

        self.store.update(&filter, &UserUpdate::credentials(salt, hash))?;
        debug!(id = %args.id, "user password updated");

        Ok(UpdatePasswordReply {})
    }

    fn find(&self, filter: &UserFilter) -> ServiceResult<UserEntry> {
        self.store.find_one(filter)?.ok_or(ServiceError::NotFound)
    }

    /// Shared lookup-and-verify for both login paths
    fn authenticate(&self, filter: &UserFilter, password: &str) -> ServiceResult<UserEntry> {
        let entry = match self.store.find_one(filter)? {
            Some(entry) => entry,
            None if self.auth.opaque_login_failures => {
                self.hasher.burn(password);
                return Err(ServiceError::Unauthorized);
            }
            None => return Err(ServiceError::NotFound),
        };

        self.hasher
            .verify(password, &entry.password_salt, &entry.password_hash)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::auth::test_hasher;
    use crate::storage::{MemoryCollection, SledCollection};

    fn create(service: &AccountService, name: &str, email: &str, password: &str) -> ServiceResult<UserId> {
        service
            .create(&CreateArgs {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .map(|r| r.id)
    }

    fn login(service: &AccountService, id: &str, password: &str) -> ServiceResult<LoginReply> {
        service.login(&LoginArgs {
            id: id.to_string(),
            password: password.to_string(),
        })
    }

    fn query(service: &AccountService, id: &str) -> ServiceResult<QueryReply> {
        service.query(&QueryArgs { id: id.to_string() })
    }

    fn find_by_id(store: &dyn UserCollection, id: &str) -> UserEntry {
        store.find_one(&UserFilter::Id(id.to_string())).unwrap().unwrap()
    }

    fn run_end_to_end(store: &dyn UserCollection) {
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(store, &hasher, &auth);

        let id = create(&service, "Test", "test@test", "TestTest").unwrap();
        assert!(!id.is_empty());

        let entry = find_by_id(store, &id);
        assert_eq!(entry.name, "Test");
        assert_eq!(entry.email, "test@test");
        assert!(!entry.password_salt.is_empty());
        assert_eq!(entry.password_hash, hasher.hash("TestTest", &entry.password_salt).unwrap());

        assert_eq!(
            query(&service, &id).unwrap(),
            QueryReply { name: "Test".into(), email: "test@test".into() }
        );
        assert_eq!(
            service.query_by_email(&QueryByEmailArgs { email: "test@test".into() }).unwrap(),
            QueryByEmailReply { id: id.clone(), name: "Test".into() }
        );
        assert_eq!(
            login(&service, &id, "TestTest").unwrap(),
            LoginReply { name: "Test".into(), email: "test@test".into() }
        );
        assert_eq!(
            service
                .login_by_email(&LoginByEmailArgs {
                    email: "test@test".into(),
                    password: "TestTest".into(),
                })
                .unwrap(),
            LoginByEmailReply { id: id.clone(), name: "Test".into() }
        );

        service
            .update_name(&UpdateNameArgs { id: id.clone(), name: "Dummy".into() })
            .unwrap();
        assert_eq!(find_by_id(store, &id).name, "Dummy");

        service
            .update_password(&UpdatePasswordArgs { id: id.clone(), password: "DummyDummy".into() })
            .unwrap();
        let updated = find_by_id(store, &id);
        assert_ne!(updated.password_salt, entry.password_salt);
        assert_eq!(updated.password_hash, hasher.hash("DummyDummy", &updated.password_salt).unwrap());

        assert_eq!(login(&service, &id, "TestTest"), Err(ServiceError::Unauthorized));
        assert_eq!(login(&service, &id, "DummyDummy").unwrap().name, "Dummy");
        assert!(service
            .login_by_email(&LoginByEmailArgs {
                email: "test@test".into(),
                password: "DummyDummy".into(),
            })
            .is_ok());

        service.destroy(&DestroyArgs { id: id.clone() }).unwrap();
        assert_eq!(query(&service, &id), Err(ServiceError::NotFound));
        assert_eq!(login(&service, &id, "DummyDummy"), Err(ServiceError::NotFound));
        assert_eq!(
            service.query_by_email(&QueryByEmailArgs { email: "test@test".into() }),
            Err(ServiceError::NotFound)
        );
        assert!(store.find_one(&UserFilter::Id(id)).unwrap().is_none());
    }

    #[test]
    fn test_end_to_end_memory() {
        run_end_to_end(&MemoryCollection::new());
    }

    #[test]
    fn test_end_to_end_sled() {
        let store = SledCollection::temporary("testing").unwrap();
        run_end_to_end(&store);
        store.close().unwrap();
    }

    #[test]
    fn test_duplicate_email_leaves_existing_entry() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let id = create(&service, "First", "dup@test", "one").unwrap();
        let before = find_by_id(&store, &id);

        assert_eq!(
            create(&service, "Second", "dup@test", "two"),
            Err(ServiceError::DuplicateKey("email"))
        );
        assert_eq!(find_by_id(&store, &id), before);
        assert_eq!(store.len(), 1);
        assert!(login(&service, &id, "one").is_ok());
    }

    #[test]
    fn test_wrong_password_does_not_mutate() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let id = create(&service, "Test", "test@test", "right").unwrap();
        let before = find_by_id(&store, &id);

        assert_eq!(login(&service, &id, "wrong"), Err(ServiceError::Unauthorized));
        assert_eq!(
            service.login_by_email(&LoginByEmailArgs {
                email: "test@test".into(),
                password: "wrong".into(),
            }),
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(find_by_id(&store, &id), before);
    }

    #[test]
    fn test_missing_entries_report_not_found() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        assert_eq!(query(&service, "nope"), Err(ServiceError::NotFound));
        assert_eq!(login(&service, "nope", "pw"), Err(ServiceError::NotFound));
        assert_eq!(
            service.destroy(&DestroyArgs { id: "nope".into() }),
            Err(ServiceError::NotFound)
        );
        assert_eq!(
            service.update_name(&UpdateNameArgs { id: "nope".into(), name: "x".into() }),
            Err(ServiceError::NotFound)
        );
        assert_eq!(
            service.update_password(&UpdatePasswordArgs { id: "nope".into(), password: "x".into() }),
            Err(ServiceError::NotFound)
        );
        assert!(store.is_empty());
    }

    /// Collection whose entries disappear right after they are found, as if a
    /// concurrent destroy ran between the lookup and the write.
    struct RemovedAfterFind(MemoryCollection);

    impl UserCollection for RemovedAfterFind {
        fn find_one(&self, filter: &UserFilter) -> Result<Option<UserEntry>, crate::storage::StoreError> {
            let found = self.0.find_one(filter)?;
            if found.is_some() {
                self.0.remove(filter)?;
            }
            Ok(found)
        }

        fn insert(&self, entry: &UserEntry) -> Result<(), crate::storage::StoreError> {
            self.0.insert(entry)
        }

        fn update(&self, filter: &UserFilter, fields: &UserUpdate) -> Result<(), crate::storage::StoreError> {
            self.0.update(filter, fields)
        }

        fn remove(&self, filter: &UserFilter) -> Result<(), crate::storage::StoreError> {
            self.0.remove(filter)
        }
    }

    #[test]
    fn test_update_password_surfaces_concurrent_destroy() {
        let store = RemovedAfterFind(MemoryCollection::new());
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let id = create(&service, "Test", "race@test", "pw").unwrap();

        assert_eq!(
            service.update_password(&UpdatePasswordArgs { id, password: "new".into() }),
            Err(ServiceError::NotFound)
        );
        assert!(store.0.is_empty());
    }

    #[test]
    fn test_login_by_email_not_found() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let login_by_email = |email: &str| {
            service.login_by_email(&LoginByEmailArgs {
                email: email.to_string(),
                password: "pw".to_string(),
            })
        };

        assert_eq!(login_by_email("nobody@test"), Err(ServiceError::NotFound));

        let id = create(&service, "Test", "gone@test", "pw").unwrap();
        assert!(login_by_email("gone@test").is_ok());

        service.destroy(&DestroyArgs { id }).unwrap();
        assert_eq!(login_by_email("gone@test"), Err(ServiceError::NotFound));
    }

    #[test]
    fn test_opaque_login_failures() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig { opaque_login_failures: true };
        let service = AccountService::new(&store, &hasher, &auth);

        let id = create(&service, "Test", "test@test", "right").unwrap();

        assert_eq!(login(&service, "nope", "right"), Err(ServiceError::Unauthorized));
        assert_eq!(login(&service, &id, "wrong"), Err(ServiceError::Unauthorized));
        assert_eq!(
            service.login_by_email(&LoginByEmailArgs {
                email: "nobody@test".into(),
                password: "right".into(),
            }),
            Err(ServiceError::Unauthorized)
        );
        // Lookups are unaffected
        assert_eq!(query(&service, "nope"), Err(ServiceError::NotFound));
    }

    #[test]
    fn test_blank_arguments_are_rejected() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        assert_eq!(
            create(&service, " ", "a@test", "pw"),
            Err(ServiceError::InvalidArgument("name"))
        );
        assert_eq!(
            create(&service, "Name", "", "pw"),
            Err(ServiceError::InvalidArgument("email"))
        );
        assert_eq!(query(&service, ""), Err(ServiceError::InvalidArgument("id")));

        let id = create(&service, "Name", "a@test", "pw").unwrap();
        assert_eq!(
            service.update_name(&UpdateNameArgs { id, name: "".into() }),
            Err(ServiceError::InvalidArgument("name"))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_each_create_gets_a_fresh_id_and_salt() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let a = create(&service, "Same", "a@test", "same").unwrap();
        let b = create(&service, "Same", "b@test", "same").unwrap();
        assert_ne!(a, b);

        let (ea, eb) = (find_by_id(&store, &a), find_by_id(&store, &b));
        assert_ne!(ea.password_salt, eb.password_salt);
        assert_ne!(ea.password_hash, eb.password_hash);
    }

    #[test]
    fn test_update_name_keeps_credentials() {
        let store = MemoryCollection::new();
        let hasher = test_hasher();
        let auth = AuthConfig::default();
        let service = AccountService::new(&store, &hasher, &auth);

        let id = create(&service, "Old", "n@test", "pw").unwrap();
        let before = find_by_id(&store, &id);

        service
            .update_name(&UpdateNameArgs { id: id.clone(), name: "New".into() })
            .unwrap();
        let after = find_by_id(&store, &id);
        assert_eq!(after.name, "New");
        assert_eq!(after.password_salt, before.password_salt);
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(query(&service, &id).unwrap().name, "New");
    }
}
