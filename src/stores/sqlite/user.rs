//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, DropTable, MapRow},
    password::PasswordHash,
    stores::{UserStore, sqlite::close_connection},
    user::{User, UserID, timestamp_now},
};

/// Handles the creation and retrieval of User objects.
///
/// Email addresses are compared exactly (SQLite's `BINARY` collation), both by
/// the unique index and by [UserStore::by_email].
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    ///
    /// The user table is not created here, call [UserStore::auto_migrate] or
    /// [initialize](crate::db::initialize) first.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns a [Error::ConstraintViolation] if the email is taken or an
    /// [Error::BackendError] if another SQL related error occurred.
    fn create(&self, user: &mut User) -> Result<(), Error> {
        let now = timestamp_now();
        let connection = self.connection.lock()?;

        connection.execute(
            "INSERT INTO user (name, email, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &user.name,
                &user.email,
                user.password_hash.as_ref(),
                now,
                now,
            ),
        )?;

        user.id = UserID::new(connection.last_insert_rowid());
        user.created_at = now;
        user.updated_at = now;

        tracing::debug!("inserted user {}", user.id);

        Ok(())
    }

    /// Get the user from the database that has the specified `id`, or return [Error::NotFound] if such user does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [Error::InvalidArgument] if `id` is not positive, [Error::NotFound] if there is no user with the specified ID, or [Error::BackendError] if there are SQL related errors.
    fn by_id(&self, id: UserID) -> Result<User, Error> {
        let id = id.validate()?;

        self.connection
            .lock()?
            .prepare(
                "SELECT id, name, email, password_hash, created_at, updated_at
                FROM user WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], SQLiteUserStore::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user from the database that has the specified `email` address, or return [Error::NotFound] if such user does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [Error::NotFound] error if there is no user with the specified email or [Error::BackendError] there are SQL related errors.
    fn by_email(&self, email: &str) -> Result<User, Error> {
        self.connection
            .lock()?
            .prepare(
                "SELECT id, name, email, password_hash, created_at, updated_at
                FROM user WHERE email = :email",
            )?
            .query_row(&[(":email", &email)], SQLiteUserStore::map_row)
            .map_err(|e| e.into())
    }

    fn update(&self, user: &mut User) -> Result<(), Error> {
        let id = user.id.validate()?;
        let now = timestamp_now();

        let rows_affected = self.connection.lock()?.execute(
            "UPDATE user SET name = ?1, email = ?2, password_hash = ?3, updated_at = ?4
            WHERE id = ?5",
            (&user.name, &user.email, user.password_hash.as_ref(), now, id),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        user.updated_at = now;

        tracing::debug!("updated user {}", user.id);

        Ok(())
    }

    fn delete(&self, id: UserID) -> Result<(), Error> {
        let id = id.validate()?;

        let rows_affected = self
            .connection
            .lock()?
            .execute("DELETE FROM user WHERE id = ?1", (id,))?;

        tracing::debug!("deleted {rows_affected} user(s) with ID {id}");

        Ok(())
    }

    /// Close the database connection.
    ///
    /// If the connection is shared with other stores, only this handle is
    /// released and the connection is closed when the last handle is dropped.
    fn close(self) -> Result<(), Error> {
        close_connection(self.connection)
    }

    fn auto_migrate(&self) -> Result<(), Error> {
        SQLiteUserStore::create_table(&*self.connection.lock()?)?;

        Ok(())
    }

    fn destructive_reset(&self) -> Result<(), Error> {
        let connection = self.connection.lock()?;

        SQLiteUserStore::drop_table(&connection)?;
        SQLiteUserStore::create_table(&connection)?;

        tracing::info!("dropped and recreated the user table");

        Ok(())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl DropTable for SQLiteUserStore {
    fn drop_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute("DROP TABLE IF EXISTS user", ())?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let name = row.get(offset + 1)?;
        let email = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;
        let created_at = row.get(offset + 4)?;
        let updated_at = row.get(offset + 5)?;

        Ok(User {
            id: UserID::new(raw_id),
            name,
            email,
            password: Default::default(),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            created_at,
            updated_at,
        })
    }
}
