pub mod file_store;
pub mod memory;

use std::fmt;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Slot holding the serialized user record of the active session
pub const SESSION_KEY: &str = "sync_wizard.session";

/// Slot holding the last-activity timestamp (milliseconds since epoch)
pub const LAST_ACTIVITY_KEY: &str = "sync_wizard.last_activity";

/// Slot holding the serialized wizard draft
pub const DRAFT_KEY: &str = "sync_wizard.job_draft";

/// Storage-level errors
#[derive(Debug)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    Io(std::io::Error),

    /// A value could not be encoded or decoded
    Serialization(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "Storage I/O error: {}", e),
            StorageError::Serialization(e) => write!(f, "Storage serialization error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e)
    }
}

/// Durable string-keyed storage
///
/// Values are opaque strings; callers own their encoding.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
