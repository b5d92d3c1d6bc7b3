//! Defines a user account and its ID type.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, PlaintextPassword};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// The ID of a user that has not been created in a store yet.
    pub const UNSAVED: UserID = UserID(0);

    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Check that the ID could refer to a stored user.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidArgument] if the ID is zero or negative.
    pub fn validate(self) -> Result<i64, Error> {
        if self.0 <= 0 {
            return Err(Error::InvalidArgument(format!(
                "user ID must be positive, got {}",
                self.0
            )));
        }

        Ok(self.0)
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user account.
///
/// Build a new user with [User::new] and hand it to
/// [UserService::create](crate::UserService::create), which hashes the password
/// and lets the store fill in the ID and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the store.
    pub id: UserID,
    /// The display name, may be empty.
    pub name: String,
    /// The email address, unique across all users.
    pub email: String,
    /// The plaintext password. Only set as input to the service, never stored.
    #[serde(skip)]
    pub password: PlaintextPassword,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user was first stored.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last written to the store.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Create a user that has not been stored yet.
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            id: UserID::UNSAVED,
            name: name.to_owned(),
            email: email.to_owned(),
            password: PlaintextPassword::new(password),
            password_hash: PasswordHash::default(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// The current time truncated to whole seconds, so that timestamps read back
/// from a store compare equal to the ones written.
pub(crate) fn timestamp_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - time::Duration::nanoseconds(now.nanosecond() as i64)
}

#[cfg(test)]
mod user_tests {
    use super::{User, UserID, timestamp_now};
    use crate::Error;

    #[test]
    fn new_user_is_unsaved() {
        let user = User::new("Alice", "alice@example.com", "hunter2");

        assert_eq!(user.id, UserID::UNSAVED);
        assert!(user.password_hash.is_empty());
        assert!(!user.password.is_empty());
    }

    #[test]
    fn validate_rejects_non_positive_ids() {
        assert!(matches!(
            UserID::new(0).validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            UserID::new(-5).validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(UserID::new(7).validate(), Ok(7));
    }

    #[test]
    fn serialized_user_omits_plaintext_password() {
        let user = User::new("Alice", "alice@example.com", "hunter2");

        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("hunter2"), "got {json}");
        assert!(!json.contains("\"password\""), "got {json}");
    }

    #[test]
    fn timestamp_has_whole_seconds() {
        assert_eq!(timestamp_now().nanosecond(), 0);
    }
}
