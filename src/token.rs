//! Generates random tokens for sessions and remember-me cookies.
//!
//! Bytes come from the operating system's CSPRNG and are rendered as padded,
//! URL-safe base64 so the tokens can be placed in cookies and URLs as is.

use base64ct::{Base64Url, Encoding};
use rand::{RngCore, rngs::OsRng};

use crate::Error;

/// The number of random bytes in a remember token (256 bits).
pub const REMEMBER_TOKEN_BYTES: usize = 32;

/// Generate `n` cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [Error::RandomSourceError] if the operating system could not supply
/// the bytes. Weak or zero-filled data is never returned.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = vec![0u8; n];

    OsRng.try_fill_bytes(&mut bytes).map_err(|error| {
        tracing::error!("the OS random source failed: {error}");
        Error::RandomSourceError(error.to_string())
    })?;

    Ok(bytes)
}

/// Generate a URL-safe base64 encoding of `n` random bytes.
///
/// # Errors
///
/// Returns [Error::RandomSourceError] if the random bytes could not be generated.
pub fn random_token(n: usize) -> Result<String, Error> {
    let bytes = random_bytes(n)?;

    Ok(Base64Url::encode_string(&bytes))
}

/// Generate a token of [REMEMBER_TOKEN_BYTES] random bytes.
///
/// # Errors
///
/// Returns [Error::RandomSourceError] if the random bytes could not be generated.
pub fn remember_token() -> Result<String, Error> {
    random_token(REMEMBER_TOKEN_BYTES)
}

/// Decode `token` and return how many bytes it holds.
///
/// # Errors
///
/// Returns [Error::InvalidArgument] if `token` is not padded, URL-safe base64.
pub fn token_byte_len(token: &str) -> Result<usize, Error> {
    Base64Url::decode_vec(token)
        .map(|bytes| bytes.len())
        .map_err(|error| Error::InvalidArgument(format!("malformed token: {error}")))
}
