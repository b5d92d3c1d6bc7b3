//! The account service: password handling and authentication on top of a [UserStore].

use crate::{Error, PasswordHash, PlaintextPassword, User, UserID, stores::UserStore};

/// Wraps a [UserStore] and handles the credentials the store must never see
/// in plaintext.
///
/// Request handlers should depend on this type rather than on a store. The
/// service keeps no state between calls, so it can be shared between threads
/// whenever the store can.
#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
    cost: u32,
}

impl<S: UserStore> UserService<S> {
    /// Create a service that hashes passwords with [PasswordHash::DEFAULT_COST].
    pub fn new(store: S) -> Self {
        Self::with_cost(store, PasswordHash::DEFAULT_COST)
    }

    /// Create a service that hashes passwords with the bcrypt work factor `cost`.
    pub fn with_cost(store: S, cost: u32) -> Self {
        Self { store, cost }
    }

    /// Hash the user's password and insert the user into the store.
    ///
    /// On success the plaintext password has been cleared, and the ID and
    /// timestamps have been filled in by the store.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the password could not be hashed (e.g.
    /// it is longer than 71 bytes). Store errors are returned unchanged.
    pub fn create(&self, user: &mut User) -> Result<(), Error> {
        self.hash_password(user)?;
        self.store.create(user)?;

        tracing::info!("created user {}", user.id);

        Ok(())
    }

    /// Get a user by their ID.
    pub fn by_id(&self, id: UserID) -> Result<User, Error> {
        self.store.by_id(id)
    }

    /// Get a user by their email address.
    pub fn by_email(&self, email: &str) -> Result<User, Error> {
        self.store.by_email(email)
    }

    /// Save all of the user's fields.
    ///
    /// If a new plaintext password has been set on `user`, it is hashed and
    /// cleared first. Otherwise the stored password hash is left as is.
    pub fn update(&self, user: &mut User) -> Result<(), Error> {
        if !user.password.is_empty() {
            self.hash_password(user)?;
        }

        self.store.update(user)
    }

    /// Remove the user with the given ID.
    pub fn delete(&self, id: UserID) -> Result<(), Error> {
        self.store.delete(id)?;

        tracing::info!("deleted user {id}");

        Ok(())
    }

    /// Release the store's resources.
    pub fn close(self) -> Result<(), Error> {
        self.store.close()
    }

    /// Create the user storage if it does not exist yet.
    pub fn auto_migrate(&self) -> Result<(), Error> {
        self.store.auto_migrate()
    }

    /// Drop and recreate the user storage. Never use this on live data.
    pub fn destructive_reset(&self) -> Result<(), Error> {
        self.store.destructive_reset()
    }

    /// Check an email and password pair, returning the matching user.
    ///
    /// # Errors
    ///
    /// - Errors from looking up the email are returned unchanged, in
    ///   particular [Error::NotFound] for an unknown email.
    /// - [Error::InvalidCredentials] if the password does not match.
    /// - [Error::BackendError] if the stored hash could not be checked.
    ///
    /// The first two are distinct so the caller can decide how much to reveal.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let user = self.store.by_email(email)?;

        if user.password_hash.verify(&PlaintextPassword::new(password))? {
            Ok(user)
        } else {
            tracing::warn!("invalid password for user {}", user.id);
            Err(Error::InvalidCredentials)
        }
    }

    fn hash_password(&self, user: &mut User) -> Result<(), Error> {
        user.password_hash = PasswordHash::new(&user.password, self.cost).inspect_err(|error| {
            tracing::error!("an error occurred while hashing a password: {error}");
        })?;
        user.password.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, PlaintextPassword, User, UserID,
        stores::{MemoryUserStore, SQLiteUserStore, UserStore},
    };

    use super::UserService;

    const TEST_COST: u32 = 4;

    fn sqlite_service() -> UserService<SQLiteUserStore> {
        let connection = Connection::open_in_memory().unwrap();
        let service = UserService::with_cost(
            SQLiteUserStore::new(Arc::new(Mutex::new(connection))),
            TEST_COST,
        );
        service.auto_migrate().unwrap();

        service
    }

    fn memory_service() -> UserService<MemoryUserStore> {
        UserService::with_cost(MemoryUserStore::new(), TEST_COST)
    }

    fn create_user<S: UserStore>(service: &UserService<S>, email: &str, password: &str) -> User {
        let mut user = User::new("Alice", email, password);
        service.create(&mut user).unwrap();
        user
    }

    #[test]
    fn create_hashes_and_clears_password() {
        let service = sqlite_service();

        let user = create_user(&service, "alice@example.com", "correct horse");

        assert!(user.id.as_i64() > 0);
        assert!(user.password.is_empty());
        assert!(!user.password_hash.is_empty());
        assert_ne!(user.password_hash.as_ref(), "correct horse");

        let stored = service.by_email("alice@example.com").unwrap();
        assert!(stored.id.as_i64() > 0);
        assert!(stored.password.is_empty());
        assert!(!stored.password_hash.is_empty());
        assert_eq!(stored, user);
    }

    #[test]
    fn create_works_for_several_users() {
        let service = memory_service();
        let cases = [
            ("", "empty.name@example.com", "a"),
            ("Bob", "bob@example.com", "hunter2"),
            ("Zoë", "zoe@example.com", "ünïcödé pässwörd"),
        ];

        for (name, email, password) in cases {
            let mut user = User::new(name, email, password);
            service.create(&mut user).unwrap();

            let stored = service.by_email(email).unwrap();
            assert_eq!(stored.name, name);
            assert!(stored.id.as_i64() > 0);
            assert!(stored.password.is_empty());
            assert!(stored.password_hash.verify(&PlaintextPassword::new(password)).unwrap());
        }
    }

    #[test]
    fn create_fails_with_hashing_error_on_long_password() {
        let service = memory_service();
        let mut user = User::new("Alice", "alice@example.com", &"a".repeat(73));

        let result = service.create(&mut user);

        assert!(matches!(result, Err(Error::HashingError(_))));
        assert_eq!(service.by_email("alice@example.com"), Err(Error::NotFound));
    }

    #[test]
    fn create_fails_with_hashing_error_on_invalid_cost() {
        let service = UserService::with_cost(MemoryUserStore::new(), 3);
        let mut user = User::new("Alice", "alice@example.com", "hunter2");

        let result = service.create(&mut user);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }

    #[test]
    fn create_fails_on_duplicate_email_and_keeps_first_user() {
        let service = sqlite_service();
        let first = create_user(&service, "alice@example.com", "first password");

        let mut second = User::new("Mallory", "alice@example.com", "second password");
        let result = service.create(&mut second);

        assert!(
            matches!(result, Err(Error::ConstraintViolation(_))),
            "want ConstraintViolation, got {result:?}"
        );
        assert_eq!(service.by_id(first.id), Ok(first.clone()));
        assert_eq!(
            service.authenticate("alice@example.com", "first password"),
            Ok(first)
        );
    }

    #[test]
    fn authenticate_succeeds_with_correct_password() {
        let service = sqlite_service();
        let user = create_user(&service, "alice@example.com", "correct horse");

        let authenticated = service
            .authenticate("alice@example.com", "correct horse")
            .unwrap();

        assert_eq!(authenticated, user);
    }

    #[test]
    fn authenticate_fails_with_wrong_password() {
        let service = sqlite_service();
        create_user(&service, "alice@example.com", "correct horse");

        let result = service.authenticate("alice@example.com", "battery staple");

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn authenticate_fails_with_unknown_email() {
        let service = sqlite_service();
        create_user(&service, "alice@example.com", "correct horse");

        let result = service.authenticate("bob@example.com", "correct horse");

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn authenticate_fails_with_backend_error_on_malformed_hash() {
        let service = memory_service();
        let mut user = User::new("Alice", "alice@example.com", "");
        user.password_hash = PasswordHash::new_unchecked("not a bcrypt hash");
        MemoryUserStore::create(&service.store, &mut user).unwrap();

        let result = service.authenticate("alice@example.com", "hunter2");

        assert!(matches!(result, Err(Error::BackendError(_))));
    }

    #[test]
    fn by_id_fails_on_non_positive_id() {
        let service = sqlite_service();
        create_user(&service, "alice@example.com", "hunter2");

        assert!(matches!(
            service.by_id(UserID::new(0)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            service.by_id(UserID::new(-5)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn delete_fails_on_zero_id() {
        let service = sqlite_service();

        assert!(matches!(
            service.delete(UserID::new(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn delete_removes_user() {
        let service = sqlite_service();
        let user = create_user(&service, "alice@example.com", "hunter2");

        service.delete(user.id).unwrap();

        assert_eq!(service.by_id(user.id), Err(Error::NotFound));
        assert_eq!(
            service.authenticate("alice@example.com", "hunter2"),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_name_keeps_password_hash() {
        let service = sqlite_service();
        let user = create_user(&service, "alice@example.com", "hunter2");

        let mut fetched = service.by_id(user.id).unwrap();
        fetched.name = "Alicia".to_owned();
        service.update(&mut fetched).unwrap();

        let refetched = service.by_id(user.id).unwrap();
        assert_eq!(refetched.name, "Alicia");
        assert_eq!(refetched.password_hash, user.password_hash);
        assert!(refetched.updated_at >= user.updated_at);
        assert_eq!(refetched.created_at, user.created_at);
    }

    #[test]
    fn update_with_new_password_rehashes() {
        let service = memory_service();
        let user = create_user(&service, "alice@example.com", "old password");

        let mut fetched = service.by_id(user.id).unwrap();
        fetched.password = PlaintextPassword::new("new password");
        service.update(&mut fetched).unwrap();

        assert!(fetched.password.is_empty());
        assert_ne!(fetched.password_hash, user.password_hash);
        assert_eq!(
            service.authenticate("alice@example.com", "old password"),
            Err(Error::InvalidCredentials)
        );
        assert!(service.authenticate("alice@example.com", "new password").is_ok());
    }

    #[test]
    fn update_fails_on_deleted_user() {
        let service = sqlite_service();
        let mut user = create_user(&service, "alice@example.com", "hunter2");
        service.delete(user.id).unwrap();

        assert_eq!(service.update(&mut user), Err(Error::NotFound));
    }

    #[test]
    fn destructive_reset_removes_users() {
        let service = sqlite_service();
        let user = create_user(&service, "alice@example.com", "hunter2");

        service.destructive_reset().unwrap();

        assert_eq!(service.by_id(user.id), Err(Error::NotFound));
    }

    #[test]
    fn close_consumes_service() {
        let service = sqlite_service();
        create_user(&service, "alice@example.com", "hunter2");

        assert_eq!(service.close(), Ok(()));
    }

    #[test]
    fn concurrent_creates_with_same_email_only_succeed_once() {
        let service = Arc::new(sqlite_service());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    let mut user = User::new(&format!("User {i}"), "same@example.com", "hunter2");
                    service.create(&mut user)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 1, "got {results:?}");
        assert!(
            results
                .iter()
                .filter(|result| result.is_err())
                .all(|result| matches!(result, Err(Error::ConstraintViolation(_))))
        );
    }
}
