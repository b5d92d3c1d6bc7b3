//! Bundles the services that share one database connection.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, PasswordHash, UserService, db,
    stores::{
        SQLiteUserStore,
        sqlite::{close_connection, open_connection},
    },
};

/// The services backed by a single SQLite database.
///
/// Schema management through this type covers every table the bundle owns,
/// whereas [UserService::auto_migrate] only covers the user table.
#[derive(Debug)]
pub struct Services {
    /// The account service.
    pub user: UserService<SQLiteUserStore>,
    connection: Arc<Mutex<Connection>>,
}

impl Services {
    /// Open the database at `descriptor` and hash passwords with
    /// [PasswordHash::DEFAULT_COST].
    ///
    /// The schema is not touched, call [Services::auto_migrate] afterwards.
    ///
    /// # Errors
    /// Returns an [Error::BackendError] if the database could not be opened.
    pub fn open(descriptor: &str) -> Result<Self, Error> {
        Self::open_with_cost(descriptor, PasswordHash::DEFAULT_COST)
    }

    /// Open the database at `descriptor` and hash passwords with the bcrypt
    /// work factor `cost`.
    ///
    /// # Errors
    /// Returns an [Error::BackendError] if the database could not be opened.
    pub fn open_with_cost(descriptor: &str, cost: u32) -> Result<Self, Error> {
        let connection = open_connection(descriptor)?;

        Ok(Self::new(connection, cost))
    }

    /// Build the services on top of an existing connection.
    pub fn new(connection: Arc<Mutex<Connection>>, cost: u32) -> Self {
        Self {
            user: UserService::with_cost(SQLiteUserStore::new(connection.clone()), cost),
            connection,
        }
    }

    /// Create any missing tables.
    pub fn auto_migrate(&self) -> Result<(), Error> {
        db::initialize(&*self.connection.lock()?)
    }

    /// Drop every table and create them again. Never use this on live data.
    pub fn destructive_reset(&self) -> Result<(), Error> {
        db::reset(&*self.connection.lock()?)
    }

    /// Close the database connection.
    pub fn close(self) -> Result<(), Error> {
        self.user.close()?;
        close_connection(self.connection)
    }
}
