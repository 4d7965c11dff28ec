//! In-process metadata store

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{MetadataKey, MetadataStore, Record, StoreError, Version, Versioned};

/// Metadata store kept in process memory
///
/// Each key holds the latest record and its version. Thread-safe via
/// `RwLock`; the lock is only held for the duration of a single read or
/// compare-and-set.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<MetadataKey, Versioned<Record>>>,
}

impl InMemoryMetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys ever written
    pub fn len(&self) -> usize {
        self.read().map(|records| records.len()).unwrap_or(0)
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<MetadataKey, Versioned<Record>>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<MetadataKey, Versioned<Record>>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, key: &MetadataKey) -> Result<Option<Versioned<Record>>, StoreError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn compare_and_set(
        &self,
        key: &MetadataKey,
        expected: Option<Version>,
        record: Record,
    ) -> Result<Version, StoreError> {
        let mut records = self.write()?;
        let actual = records.get(key).map(|current| current.version);

        if actual != expected {
            tracing::debug!(key = %key, ?expected, ?actual, "Compare-and-set rejected");
            return Err(StoreError::VersionMismatch {
                key: key.to_string(),
                expected,
                actual,
            });
        }

        let version = actual.map_or(1, |v| v + 1);
        records.insert(
            key.clone(),
            Versioned {
                value: record,
                version,
            },
        );

        Ok(version)
    }

    fn scope_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read()?
            .keys()
            .filter_map(|key| match key {
                MetadataKey::Scope(name) => Some(name.clone()),
                MetadataKey::Stream(_) => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ScopeRecord, StreamKey, StreamRecord};
    use crate::StreamConfiguration;

    #[test]
    fn test_insert_requires_absent_key() {
        let store = InMemoryMetadataStore::new();
        let key = MetadataKey::Scope("scope".into());

        let v1 = store
            .compare_and_set(&key, None, Record::Scope(ScopeRecord::active()))
            .unwrap();
        assert_eq!(v1, 1);

        let err = store
            .compare_and_set(&key, None, Record::Scope(ScopeRecord::active()))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionMismatch {
                key: "scope:scope".into(),
                expected: None,
                actual: Some(1),
            }
        );
    }

    #[test]
    fn test_update_bumps_version() {
        let store = InMemoryMetadataStore::new();
        let key = MetadataKey::Stream(StreamKey::new("scope", "stream"));
        let record = StreamRecord::new(StreamConfiguration::default());

        store
            .compare_and_set(&key, None, Record::Stream(record.clone()))
            .unwrap();
        let v2 = store
            .compare_and_set(&key, Some(1), Record::Stream(record.clone()))
            .unwrap();
        assert_eq!(v2, 2);

        // Stale version loses
        assert!(store
            .compare_and_set(&key, Some(1), Record::Stream(record))
            .is_err());

        let current = store.get(&key).unwrap().unwrap();
        assert_eq!(current.version, 2);
    }

    #[test]
    fn test_scope_names() {
        let store = InMemoryMetadataStore::new();
        assert!(store.is_empty());

        for name in ["a", "b"] {
            store
                .compare_and_set(
                    &MetadataKey::Scope(name.into()),
                    None,
                    Record::Scope(ScopeRecord::active()),
                )
                .unwrap();
        }
        store
            .compare_and_set(
                &MetadataKey::Stream(StreamKey::new("a", "s")),
                None,
                Record::Stream(StreamRecord::new(StreamConfiguration::default())),
            )
            .unwrap();

        let mut names = store.scope_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.len(), 3);
    }
}
