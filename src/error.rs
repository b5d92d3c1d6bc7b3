//! Defines the crate level error type and how storage errors are classified.

/// The errors that may occur while storing, fetching or authenticating users.
///
/// Errors are classified once, where they are raised, and passed through the
/// [UserService](crate::UserService) unchanged.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The caller supplied a structurally invalid input, e.g. a user ID that
    /// is not positive.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A lookup found no matching record.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A uniqueness or integrity rule was violated by the store, e.g. the
    /// email address is already in use.
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    /// The password did not match the stored password hash.
    #[error("invalid password")]
    InvalidCredentials,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with a client this error should be replaced with a
    /// general error indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The operating system's entropy source could not produce random bytes.
    #[error("could not read from the random source: {0}")]
    RandomSourceError(String),

    /// Any other failure in the persistence layer.
    #[error("an unexpected storage error occurred: {0}")]
    BackendError(String),
}

impl Error {
    /// Whether the error is an expected, caller-recoverable condition.
    ///
    /// [Error::NotFound], [Error::InvalidArgument] and [Error::InvalidCredentials]
    /// are caused by the caller's input. Every other error should be treated as
    /// a server-side failure.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Error::NotFound | Error::InvalidArgument(_) | Error::InvalidCredentials
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed, 1555 for a PRIMARY KEY.
            rusqlite::Error::SqliteFailure(sql_error, Some(desc))
                if sql_error.extended_code == 2067 || sql_error.extended_code == 1555 =>
            {
                Error::ConstraintViolation(desc)
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::BackendError(error.to_string())
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(value: std::sync::PoisonError<T>) -> Self {
        tracing::error!("could not acquire the database lock: {}", value);
        Error::BackendError("could not acquire the database lock".to_owned())
    }
}
