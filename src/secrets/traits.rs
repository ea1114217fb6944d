//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! A plain key-value interface. Keys are namespaced strings built by
//! [`api_key_name`](super::api_key_name).
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Be thread-safe (Send + Sync)
//!
//! # Example
//!
//! ```
//! use octopus_cli::secrets::{api_key_name, MemorySecretStore, SecretError, SecretStore};
//!
//! fn stored_key(store: &dyn SecretStore, host: &str) -> Result<Option<String>, SecretError> {
//!     store.get(&api_key_name(host))
//! }
//!
//! let store = MemorySecretStore::new();
//! assert_eq!(stored_key(&store, "https://octopus.local").unwrap(), None);
//!
//! store.set(&api_key_name("https://octopus.local/"), "API-XXXXXXXX").unwrap();
//! assert!(stored_key(&store, "https://octopus.local").unwrap().is_some());
//! ```

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages never include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to read secret: {0}")]
    ReadError(String),

    #[error("failed to write secret: {0}")]
    WriteError(String),
}

/// Trait for secret storage providers.
///
/// Keys are stored as given; callers namespace them. Values are returned
/// verbatim and must not reach logs, `Debug` output or error messages.
///
/// # Example
///
/// ```
/// use octopus_cli::secrets::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::new();
/// store.set("api_key.https://octopus.local", "API-XXXXXXXX").unwrap();
/// assert!(store.exists("api_key.https://octopus.local").unwrap());
///
/// store.delete("api_key.https://octopus.local").unwrap();
/// store.delete("api_key.https://octopus.local").unwrap();
/// assert_eq!(store.get("api_key.https://octopus.local").unwrap(), None);
/// ```
pub trait SecretStore: Send + Sync {
    /// Get a secret by key. `Ok(None)` if it is not stored.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Check if a secret exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SecretError::ReadError("disk full".into());
        assert_eq!(err.to_string(), "failed to read secret: disk full");

        let err = SecretError::WriteError("permission denied".into());
        assert!(err.to_string().contains("write"));
    }
}
