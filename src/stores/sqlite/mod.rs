//! Contains the SQLite backed store and a helper for opening its connection.

mod user;

pub use user::SQLiteUserStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::Error;

/// Open a SQLite connection shared by the SQLite backed stores.
///
/// `descriptor` is handed to SQLite as is: a file path, a `file:` URI or
/// `:memory:`.
///
/// # Errors
/// Returns an [Error::BackendError] if the database could not be opened.
pub fn open_connection(descriptor: &str) -> Result<Arc<Mutex<Connection>>, Error> {
    let connection = Connection::open(descriptor)?;

    tracing::debug!("opened SQLite database at {descriptor:?}");

    Ok(Arc::new(Mutex::new(connection)))
}

/// Close a shared SQLite connection.
///
/// If other handles to the connection remain, only this handle is released
/// and the connection is closed when the last handle is dropped.
///
/// # Errors
/// Returns an [Error::BackendError] if SQLite could not close the connection.
pub fn close_connection(connection: Arc<Mutex<Connection>>) -> Result<(), Error> {
    match Arc::try_unwrap(connection) {
        Ok(connection) => {
            connection
                .into_inner()?
                .close()
                .map_err(|(_, error)| Error::from(error))?;

            tracing::debug!("closed the SQLite database");

            Ok(())
        }
        Err(_) => {
            tracing::debug!("the database connection is still shared, releasing this handle");
            Ok(())
        }
    }
}
