//! Scope registry
//!
//! Tracks which scopes exist and which live streams each one contains. The
//! membership index is stored in the scope record itself so that a scope
//! and its member set always change together.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::store::{MetadataKey, MetadataStore, Record, StoreError, Version, Versioned};

/// State of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeState {
    /// Scope accepts new streams
    Active,
    /// Scope was deleted; only a tombstone remains
    Deleted,
}

/// Stored state of a single scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRecord {
    /// Current scope state
    pub state: ScopeState,
    /// Names of member streams not in the Deleted state
    pub members: BTreeSet<String>,
}

impl ScopeRecord {
    /// A fresh, empty, active scope
    pub fn active() -> Self {
        Self {
            state: ScopeState::Active,
            members: BTreeSet::new(),
        }
    }

    /// Tombstone left behind by a deletion
    pub fn deleted() -> Self {
        Self {
            state: ScopeState::Deleted,
            members: BTreeSet::new(),
        }
    }

    /// Whether the scope accepts new streams
    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }
}

/// Typed view over the scope records of a [`MetadataStore`]
pub struct ScopeRegistry<S> {
    store: Arc<S>,
}

impl<S: MetadataStore> ScopeRegistry<S> {
    /// Create a registry over the given store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read a scope record with its version
    pub fn get(&self, name: &str) -> Result<Option<Versioned<ScopeRecord>>, StoreError> {
        let key = MetadataKey::Scope(name.to_string());

        match self.store.get(&key)? {
            None => Ok(None),
            Some(Versioned {
                value: Record::Scope(value),
                version,
            }) => Ok(Some(Versioned { value, version })),
            Some(_) => Err(StoreError::UnexpectedRecord(key.to_string())),
        }
    }

    /// Check if a scope exists and is active
    pub fn scope_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(name)?
            .map(|scope| scope.value.is_active())
            .unwrap_or(false))
    }

    /// Check if a scope has no live streams
    ///
    /// Absent and deleted scopes are empty.
    pub fn is_scope_empty(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(name)?
            .map(|scope| scope.value.members.is_empty())
            .unwrap_or(true))
    }

    /// Names of all active scopes, sorted
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();

        for name in self.store.scope_names()? {
            if self.scope_exists(&name)? {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Write a scope record if the stored version is still `expected`
    pub(crate) fn put(
        &self,
        name: &str,
        expected: Option<Version>,
        record: ScopeRecord,
    ) -> Result<Version, StoreError> {
        self.store.compare_and_set(
            &MetadataKey::Scope(name.to_string()),
            expected,
            Record::Scope(record),
        )
    }
}
