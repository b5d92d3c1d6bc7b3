//! This file defines the types that hold passwords in plaintext and hashed form.
//! `PlaintextPassword` wraps the raw password a caller hands to the service.
//! `PasswordHash` converts a `PlaintextPassword` into a salted and hashed password.

use std::fmt::{Debug, Display};

use bcrypt::{non_truncating_hash, verify};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A password that has not been hashed yet.
///
/// The value only exists transiently as input to the
/// [UserService](crate::UserService) and is never written to a store.
/// `Debug` and `Display` redact the value so it cannot end up in logs.
#[derive(Clone, Default, PartialEq)]
pub struct PlaintextPassword(String);

impl PlaintextPassword {
    /// Wrap a raw password string.
    pub fn new(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }

    /// Whether the password has been cleared (or was never set).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Erase the password from memory held by this value.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl Display for PlaintextPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

impl Debug for PlaintextPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PlaintextPassword")
            .field(&format_args!("{self}"))
            .finish()
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a plaintext password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the cost is out of range or the
    /// password is longer than 71 bytes. bcrypt reads 72 bytes including a NUL
    /// terminator. Long passwords are rejected rather than silently truncated.
    pub fn new(password: &PlaintextPassword, cost: u32) -> Result<Self, Error> {
        match non_truncating_hash(password.expose(), cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether no hash has been set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// The comparison is constant time.
    ///
    /// # Errors
    ///
    /// Returns [Error::BackendError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &PlaintextPassword) -> Result<bool, Error> {
        verify(raw_password.expose(), &self.0).map_err(|error| {
            tracing::error!("could not verify a password against its stored hash: {error}");
            Error::BackendError(error.to_string())
        })
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod plaintext_password_tests {
    use super::PlaintextPassword;

    #[test]
    fn display_and_debug_redact_password() {
        let password = PlaintextPassword::new("hunter2");

        assert!(!password.to_string().contains("hunter2"));
        assert!(!format!("{password:?}").contains("hunter2"));
    }

    #[test]
    fn clear_empties_password() {
        let mut password = PlaintextPassword::new("hunter2");

        password.clear();

        assert!(password.is_empty());
    }
}
