//! Implements an in-memory user store for tests and short-lived processes.
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::{
    Error,
    stores::UserStore,
    user::{User, UserID, timestamp_now},
};

#[derive(Debug, Default)]
struct Table {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id.as_i64()) != except)
    }
}

/// Keeps users in a map guarded by a single lock.
///
/// The uniqueness check and the insert happen under the same lock, so
/// concurrent creates with the same email cannot both succeed. Emails are
/// compared exactly. IDs are never reused, even after a delete.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryUserStore {
    /// Create an empty user store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_email() -> Error {
    Error::ConstraintViolation("UNIQUE constraint failed: user.email".to_owned())
}

impl UserStore for MemoryUserStore {
    fn create(&self, user: &mut User) -> Result<(), Error> {
        let mut table = self.table.lock()?;

        if table.email_taken(&user.email, None) {
            return Err(duplicate_email());
        }

        let now = timestamp_now();
        table.last_id += 1;
        user.id = UserID::new(table.last_id);
        user.created_at = now;
        user.updated_at = now;

        let mut stored = user.clone();
        stored.password.clear();
        table.users.insert(user.id.as_i64(), stored);

        tracing::debug!("inserted user {}", user.id);

        Ok(())
    }

    fn by_id(&self, id: UserID) -> Result<User, Error> {
        let id = id.validate()?;

        self.table
            .lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn by_email(&self, email: &str) -> Result<User, Error> {
        self.table
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn update(&self, user: &mut User) -> Result<(), Error> {
        let id = user.id.validate()?;
        let mut table = self.table.lock()?;

        if !table.users.contains_key(&id) {
            return Err(Error::NotFound);
        }

        if table.email_taken(&user.email, Some(id)) {
            return Err(duplicate_email());
        }

        let now = timestamp_now();
        if let Some(stored) = table.users.get_mut(&id) {
            stored.name = user.name.clone();
            stored.email = user.email.clone();
            stored.password_hash = user.password_hash.clone();
            stored.updated_at = now;
        }
        user.updated_at = now;

        tracing::debug!("updated user {}", user.id);

        Ok(())
    }

    fn delete(&self, id: UserID) -> Result<(), Error> {
        let id = id.validate()?;

        let removed = self.table.lock()?.users.remove(&id);

        tracing::debug!("deleted user {id}: {}", removed.is_some());

        Ok(())
    }

    fn close(self) -> Result<(), Error> {
        Ok(())
    }

    fn auto_migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    fn destructive_reset(&self) -> Result<(), Error> {
        let mut table = self.table.lock()?;
        table.users.clear();

        tracing::info!("cleared the in-memory user table");

        Ok(())
    }
}
