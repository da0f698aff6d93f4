//! Durable key/value storage for session tokens.
//!
//! Only [`SessionManager`](crate::SessionManager) writes here; everyone else
//! reads tokens through it. Writes are single-key and synchronous.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use thiserror::Error;

/// Key under which the access token is persisted.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Key under which the refresh token is persisted.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Failures of the persisted store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("session storage I/O error at {path}: {source}")]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but is not a JSON object of strings.
    #[error("session storage at {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// Anything else, e.g. a poisoned lock.
    #[error("session storage error: {0}")]
    Internal(String),
}

/// A string-to-string store that survives restarts.
pub trait SessionStore: Send + Sync {
    /// Reads `key`, returning `None` when absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the write does not reach the backing medium.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backing medium cannot be updated.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
