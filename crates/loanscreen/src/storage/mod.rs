//! Key/value string storage backing drafts and saved searches.
//!
//! Mirrors the browser's local storage contract: string keys, string values, and
//! writes that may fail when the backing medium is full or unavailable.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage abstraction so drafts and search preferences can run against any backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded ({size} bytes over a {quota} byte limit)")]
    QuotaExceeded { size: usize, quota: usize },
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
