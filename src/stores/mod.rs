//! Contains the trait and implementations for objects that persist [User]s.

mod memory;

pub mod sqlite;

pub use memory::MemoryUserStore;
pub use sqlite::SQLiteUserStore;

use crate::{Error, User, UserID};

/// Handles the creation, retrieval, modification and removal of [User]s.
///
/// Implementations classify their backend's failures into [Error] and must be
/// safe to share between threads. Uniqueness of email addresses is enforced
/// here, atomically with the insert, never by the caller.
pub trait UserStore: Send + Sync {
    /// Insert a new user and backfill its ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [Error::ConstraintViolation] if the email is already in use or
    /// [Error::BackendError] for any other storage failure.
    fn create(&self, user: &mut User) -> Result<(), Error>;

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidArgument] if `id` is not positive or
    /// [Error::NotFound] if no user has the ID.
    fn by_id(&self, id: UserID) -> Result<User, Error>;

    /// Get a user by their email address.
    ///
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn by_email(&self, email: &str) -> Result<User, Error>;

    /// Save the name, email and password hash of `user`, keyed by its ID,
    /// and refresh its update timestamp.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidArgument] if the ID is not positive,
    /// [Error::NotFound] if the user no longer exists, or
    /// [Error::ConstraintViolation] if the new email belongs to another user.
    fn update(&self, user: &mut User) -> Result<(), Error>;

    /// Remove the user with the given ID. Removing a user that does not exist
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidArgument] if `id` is not positive.
    fn delete(&self, id: UserID) -> Result<(), Error>;

    /// Release the store's connection.
    fn close(self) -> Result<(), Error>
    where
        Self: Sized;

    /// Create the user storage if it does not exist yet.
    fn auto_migrate(&self) -> Result<(), Error>;

    /// Drop the user storage and everything in it, then run
    /// [UserStore::auto_migrate].
    ///
    /// Only intended for tests and bootstrapping.
    fn destructive_reset(&self) -> Result<(), Error>;
}
