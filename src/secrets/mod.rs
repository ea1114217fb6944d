//! secrets
//!
//! Storage for API keys.
//!
//! # Architecture
//!
//! Secrets go through the [`SecretStore`] trait:
//!
//! - [`FileSecretStore`]: `~/.octopus/secrets.toml`, used by the CLI
//! - [`MemorySecretStore`]: process-local, used by tests
//!
//! API keys are stored per server, under the name returned by
//! [`api_key_name`], so logging in to a second server keeps the first key.
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - All file writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use octopus_cli::secrets::{api_key_name, FileSecretStore, SecretStore};
//!
//! let store = FileSecretStore::new()?;
//! let key = api_key_name("https://example.octopus.app");
//! store.set(&key, "API-XXXXXXXX")?;
//!
//! if let Some(api_key) = store.get(&key)? {
//!     // Use the key (never print it!)
//! }
//! ```

mod file_store;
mod memory_store;
mod traits;

pub use file_store::FileSecretStore;
pub use memory_store::MemorySecretStore;
pub use traits::{SecretError, SecretStore};

/// Name under which the API key for `host` is stored.
///
/// Trailing slashes are ignored, so `https://a/` and `https://a` share a key.
pub fn api_key_name(host: &str) -> String {
    format!("api_key.{}", host.trim_end_matches('/'))
}
