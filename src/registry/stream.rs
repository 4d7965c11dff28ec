//! Stream registry
//!
//! Holds per-stream state, configuration and configuration epoch.

use std::sync::Arc;

use super::config::StreamConfiguration;
use super::key::StreamKey;
use crate::store::{MetadataKey, MetadataStore, Record, StoreError, Version, Versioned};

/// State of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Stream accepts writes and configuration updates
    Active,
    /// Stream is frozen against writes; may now be deleted
    Sealed,
    /// Stream was deleted; only a tombstone remains
    Deleted,
}

/// Stored state of a single stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Current stream state
    pub state: StreamState,
    /// Current configuration
    pub config: StreamConfiguration,
    /// Configuration epoch, bumped on every accepted update
    pub epoch: u64,
    /// Incarnation of the stream name, bumped every time a deleted stream
    /// is created again
    pub generation: u64,
}

impl StreamRecord {
    /// A freshly created, active stream at epoch 0
    pub fn new(config: StreamConfiguration) -> Self {
        Self {
            state: StreamState::Active,
            config,
            epoch: 0,
            generation: 0,
        }
    }

    /// A new incarnation replacing this (deleted) record
    ///
    /// Starts over at epoch 0 with the new configuration; nothing of the
    /// previous incarnation carries over except the generation counter.
    pub(crate) fn recreated(&self, config: StreamConfiguration) -> Self {
        Self {
            generation: self.generation + 1,
            ..Self::new(config)
        }
    }

    /// The record after an accepted configuration update
    pub(crate) fn updated(&self, config: StreamConfiguration) -> Self {
        Self {
            config,
            epoch: self.epoch + 1,
            ..self.clone()
        }
    }

    /// The record moved to another state, configuration untouched
    pub(crate) fn with_state(&self, state: StreamState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

/// Snapshot of a stream returned to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Stream identity
    pub key: StreamKey,
    /// Current stream state
    pub state: StreamState,
    /// Current configuration
    pub config: StreamConfiguration,
    /// Configuration epoch
    pub epoch: u64,
    /// Incarnation of the stream name
    pub generation: u64,
}

/// Typed view over the stream records of a [`MetadataStore`]
pub struct StreamRegistry<S> {
    store: Arc<S>,
}

impl<S: MetadataStore> StreamRegistry<S> {
    /// Create a registry over the given store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read a stream record with its version
    pub fn get(&self, key: &StreamKey) -> Result<Option<Versioned<StreamRecord>>, StoreError> {
        let key = MetadataKey::Stream(key.clone());

        match self.store.get(&key)? {
            None => Ok(None),
            Some(Versioned {
                value: Record::Stream(value),
                version,
            }) => Ok(Some(Versioned { value, version })),
            Some(_) => Err(StoreError::UnexpectedRecord(key.to_string())),
        }
    }

    /// Check if a stream exists and has not been deleted
    pub fn stream_exists(&self, key: &StreamKey) -> Result<bool, StoreError> {
        Ok(matches!(
            self.get(key)?,
            Some(Versioned { value, .. }) if value.state != StreamState::Deleted
        ))
    }

    /// Get a snapshot of a stream, including deleted tombstones
    pub fn info(&self, key: &StreamKey) -> Result<Option<StreamInfo>, StoreError> {
        Ok(self.get(key)?.map(|stream| StreamInfo {
            key: key.clone(),
            state: stream.value.state,
            config: stream.value.config,
            epoch: stream.value.epoch,
            generation: stream.value.generation,
        }))
    }

    /// Write a stream record if the stored version is still `expected`
    pub(crate) fn put(
        &self,
        key: &StreamKey,
        expected: Option<Version>,
        record: StreamRecord,
    ) -> Result<Version, StoreError> {
        self.store.compare_and_set(
            &MetadataKey::Stream(key.clone()),
            expected,
            Record::Stream(record),
        )
    }
}
