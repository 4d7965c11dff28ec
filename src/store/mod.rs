//! Metadata store interface
//!
//! The controller persists scope and stream records through a key-addressed
//! store offering versioned compare-and-set per key. Records are never
//! removed; a deleted entity stays behind as a tombstone in its terminal
//! state.
//!
//! Any backing store (a coordination service, an embedded database) can be
//! plugged in by implementing [`MetadataStore`]. [`InMemoryMetadataStore`]
//! is the process-local implementation.

pub mod memory;

pub use memory::InMemoryMetadataStore;

use crate::registry::{ScopeRecord, StreamKey, StreamRecord};

/// Version of a stored record; starts at 1 and grows with every write
pub type Version = u64;

/// Address of a record in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// A scope record
    Scope(String),
    /// A stream record
    Stream(StreamKey),
}

impl std::fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataKey::Scope(name) => write!(f, "scope:{}", name),
            MetadataKey::Stream(key) => write!(f, "stream:{}", key),
        }
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Scope(ScopeRecord),
    Stream(StreamRecord),
}

/// A value together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-set lost against a concurrent write
    #[error("Version mismatch on {key}: expected {expected:?}, found {actual:?}")]
    VersionMismatch {
        key: String,
        expected: Option<Version>,
        actual: Option<Version>,
    },

    /// A record of the wrong kind is stored under the key
    #[error("Unexpected record kind under {0}")]
    UnexpectedRecord(String),

    /// The store cannot serve requests
    #[error("Metadata store unavailable: {0}")]
    Unavailable(String),
}

/// Key-addressed record store with per-key compare-and-set
pub trait MetadataStore: Send + Sync + 'static {
    /// Read the current record and its version
    fn get(&self, key: &MetadataKey) -> Result<Option<Versioned<Record>>, StoreError>;

    /// Write `record` if the stored version equals `expected`
    ///
    /// `expected == None` means the key must be absent. Returns the new version.
    fn compare_and_set(
        &self,
        key: &MetadataKey,
        expected: Option<Version>,
        record: Record,
    ) -> Result<Version, StoreError>;

    /// Names of every scope record, in any state
    fn scope_names(&self) -> Result<Vec<String>, StoreError>;
}
