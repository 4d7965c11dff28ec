//! Metadata controller
//!
//! The single entry point for scope and stream lifecycle operations. Each
//! operation validates its input, takes the per-key locks of its targets,
//! looks up the transition table and commits the result through the
//! registries by compare-and-set.
//!
//! # Locking
//!
//! ```text
//!   create_scope / delete_scope       scope(W)
//!   create_stream / delete_stream     scope(W) -> stream(W)
//!   update_stream / seal_stream       scope(R) -> stream(W)
//! ```
//!
//! Operations that touch a scope's member set hold that scope's write lock,
//! so a `create_stream` racing a `delete_scope` on the same scope is
//! serialized: either the deletion sees the new member and fails with
//! `ScopeNotEmpty`, or the creation sees the deleted scope and fails with
//! `ScopeNotFound`. Queries read a single record and take no locks.

pub mod config;
mod locks;

pub use config::ControllerConfig;

use std::sync::Arc;

use crate::error::{ControllerError, ErrorKind, Result};
use crate::registry::{
    validate_name, ScopeRecord, ScopeRegistry, StreamConfiguration, StreamInfo, StreamKey,
    StreamRecord, StreamRegistry, StreamState,
};
use crate::store::{InMemoryMetadataStore, MetadataStore, Version};
use crate::transition::{scope_transition, stream_transition, ScopeOp, StreamOp, Transition};

use locks::KeyLocks;

/// Control plane for scopes and streams
///
/// Owns no metadata itself: all state lives in the [`MetadataStore`]. The
/// controller owns the transaction boundary across the scope and stream
/// records.
pub struct MetadataController<S = InMemoryMetadataStore> {
    scopes: ScopeRegistry<S>,
    streams: StreamRegistry<S>,
    locks: KeyLocks,
    config: ControllerConfig,
}

impl MetadataController<InMemoryMetadataStore> {
    /// Create a controller over an in-memory store with default configuration
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Create a controller over an in-memory store with custom configuration
    pub fn with_config(config: ControllerConfig) -> Self {
        Self::with_store(Arc::new(InMemoryMetadataStore::new()), config)
    }
}

impl Default for MetadataController<InMemoryMetadataStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MetadataStore> MetadataController<S> {
    /// Create a controller over the given store
    pub fn with_store(store: Arc<S>, config: ControllerConfig) -> Self {
        Self {
            scopes: ScopeRegistry::new(Arc::clone(&store)),
            streams: StreamRegistry::new(store),
            locks: KeyLocks::new(),
            config,
        }
    }

    /// Get the controller configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Create a scope
    ///
    /// Returns `false` if an active scope with this name already exists.
    pub async fn create_scope(&self, name: &str) -> Result<bool> {
        self.check_name(name)?;

        let lock = self.locks.scope(name).await;
        let _guard = lock.write().await;

        let current = self.scopes.get(name)?;
        let state = current.as_ref().map(|scope| scope.value.state);

        match scope_transition(state, ScopeOp::Create, false) {
            Transition::Apply(_) => {
                self.scopes.put(
                    name,
                    current.map(|scope| scope.version),
                    ScopeRecord::active(),
                )?;
                tracing::info!(scope = %name, "Scope created");
                Ok(true)
            }
            Transition::NoOp => {
                tracing::debug!(scope = %name, "Scope already exists");
                Ok(false)
            }
            Transition::Reject(kind) => Err(scope_rejected(kind, name, 0)),
        }
    }

    /// Delete an empty scope
    ///
    /// Fails with `ScopeNotEmpty` while the scope has live streams. Returns
    /// `false` if the scope does not exist or was already deleted.
    pub async fn delete_scope(&self, name: &str) -> Result<bool> {
        self.check_name(name)?;

        let deleted = {
            let lock = self.locks.scope(name).await;
            let _guard = lock.write().await;
            self.delete_scope_locked(name)?
        };

        if deleted {
            self.locks.prune().await;
        }

        Ok(deleted)
    }

    fn delete_scope_locked(&self, name: &str) -> Result<bool> {
        let current = self.scopes.get(name)?;
        let state = current.as_ref().map(|scope| scope.value.state);
        let members = current
            .as_ref()
            .map_or(0, |scope| scope.value.members.len());

        match scope_transition(state, ScopeOp::Delete, members > 0) {
            Transition::Apply(_) => {
                self.scopes.put(
                    name,
                    current.map(|scope| scope.version),
                    ScopeRecord::deleted(),
                )?;
                tracing::info!(scope = %name, "Scope deleted");
                Ok(true)
            }
            Transition::NoOp => {
                tracing::debug!(scope = %name, "Scope already absent");
                Ok(false)
            }
            Transition::Reject(kind) => {
                tracing::warn!(scope = %name, streams = members, "Scope deletion rejected");
                Err(scope_rejected(kind, name, members))
            }
        }
    }

    /// Create a stream in an active scope
    ///
    /// Fails with `ScopeNotFound` if the scope is absent or deleted. Returns
    /// `false` if the stream already exists.
    pub async fn create_stream(
        &self,
        scope: &str,
        name: &str,
        config: StreamConfiguration,
    ) -> Result<bool> {
        self.check_name(scope)?;
        self.check_name(name)?;
        config.validate()?;

        let key = StreamKey::new(scope, name);
        let scope_lock = self.locks.scope(scope).await;
        let _scope_guard = scope_lock.write().await;
        let stream_lock = self.locks.stream(&key).await;
        let _stream_guard = stream_lock.write().await;

        let parent = match self.scopes.get(scope)? {
            Some(parent) if parent.value.is_active() => parent,
            _ => {
                tracing::warn!(stream = %key, "Stream creation rejected, scope not found");
                return Err(ControllerError::rejected(ErrorKind::ScopeNotFound, &key));
            }
        };

        let current = self.streams.get(&key)?;
        let state = current.as_ref().map(|stream| stream.value.state);

        match stream_transition(state, StreamOp::Create, self.config.stream_name_reuse) {
            Transition::Apply(_) => {
                // Membership is committed before the stream record and rolled
                // back if the stream write fails.
                let mut members = parent.value.clone();
                members.members.insert(name.to_string());
                let scope_version = self.scopes.put(scope, Some(parent.version), members)?;

                let record = match &current {
                    Some(previous) => previous.value.recreated(config),
                    None => StreamRecord::new(config),
                };
                let generation = record.generation;
                if let Err(e) = self
                    .streams
                    .put(&key, current.map(|stream| stream.version), record)
                {
                    self.restore_scope(scope, scope_version, parent.value);
                    return Err(e.into());
                }

                tracing::info!(
                    stream = %key,
                    generation = generation,
                    segments = config.segment_count(),
                    "Stream created"
                );
                Ok(true)
            }
            Transition::NoOp => {
                tracing::debug!(stream = %key, state = ?state, "Stream already exists");
                Ok(false)
            }
            Transition::Reject(kind) => Err(ControllerError::rejected(kind, &key)),
        }
    }

    /// Replace the configuration of an active stream
    ///
    /// Every accepted update bumps the configuration epoch by one, even when
    /// the configuration is unchanged. Fails with `StreamNotActive` otherwise.
    pub async fn update_stream(
        &self,
        scope: &str,
        name: &str,
        config: StreamConfiguration,
    ) -> Result<bool> {
        self.check_name(scope)?;
        self.check_name(name)?;
        config.validate()?;

        let key = StreamKey::new(scope, name);
        let scope_lock = self.locks.scope(scope).await;
        let _scope_guard = scope_lock.read().await;
        let stream_lock = self.locks.stream(&key).await;
        let _stream_guard = stream_lock.write().await;

        let current = self.streams.get(&key)?;
        let state = current.as_ref().map(|stream| stream.value.state);

        match (
            stream_transition(state, StreamOp::Update, self.config.stream_name_reuse),
            current,
        ) {
            (Transition::Apply(_), Some(current)) => {
                let record = current.value.updated(config);
                let epoch = record.epoch;
                self.streams.put(&key, Some(current.version), record)?;

                tracing::info!(
                    stream = %key,
                    epoch = epoch,
                    segments = config.segment_count(),
                    "Stream configuration updated"
                );
                Ok(true)
            }
            (Transition::Reject(kind), _) => {
                tracing::warn!(stream = %key, state = ?state, "Stream update rejected");
                Err(ControllerError::rejected(kind, &key))
            }
            // Update is only ever applied to an existing Active record or rejected
            (outcome, _) => unreachable!("update of {} resolved to {:?}", key, outcome),
        }
    }

    /// Seal an active stream against further writes
    ///
    /// Sealing is not idempotent: sealing a sealed, deleted or absent stream
    /// fails with `StreamNotActive`.
    pub async fn seal_stream(&self, scope: &str, name: &str) -> Result<bool> {
        self.check_name(scope)?;
        self.check_name(name)?;

        let key = StreamKey::new(scope, name);
        let scope_lock = self.locks.scope(scope).await;
        let _scope_guard = scope_lock.read().await;
        let stream_lock = self.locks.stream(&key).await;
        let _stream_guard = stream_lock.write().await;

        let current = self.streams.get(&key)?;
        let state = current.as_ref().map(|stream| stream.value.state);

        match (
            stream_transition(state, StreamOp::Seal, self.config.stream_name_reuse),
            current,
        ) {
            (Transition::Apply(next), Some(current)) => {
                self.streams
                    .put(&key, Some(current.version), current.value.with_state(next))?;
                tracing::info!(stream = %key, epoch = current.value.epoch, "Stream sealed");
                Ok(true)
            }
            (Transition::Reject(kind), _) => {
                tracing::warn!(stream = %key, state = ?state, "Stream seal rejected");
                Err(ControllerError::rejected(kind, &key))
            }
            // Seal is only ever applied to an existing Active record or rejected
            (outcome, _) => unreachable!("seal of {} resolved to {:?}", key, outcome),
        }
    }

    /// Delete a sealed stream
    ///
    /// Fails with `StreamNotSealed` if the stream is still active. Returns
    /// `false` if the stream does not exist or was already deleted.
    pub async fn delete_stream(&self, scope: &str, name: &str) -> Result<bool> {
        self.check_name(scope)?;
        self.check_name(name)?;

        let key = StreamKey::new(scope, name);
        let deleted = {
            let scope_lock = self.locks.scope(scope).await;
            let _scope_guard = scope_lock.write().await;
            let stream_lock = self.locks.stream(&key).await;
            let _stream_guard = stream_lock.write().await;
            self.delete_stream_locked(&key)?
        };

        if deleted {
            self.locks.prune().await;
        }

        Ok(deleted)
    }

    fn delete_stream_locked(&self, key: &StreamKey) -> Result<bool> {
        let current = self.streams.get(key)?;
        let state = current.as_ref().map(|stream| stream.value.state);

        let (next, current) = match (
            stream_transition(state, StreamOp::Delete, self.config.stream_name_reuse),
            current,
        ) {
            (Transition::Apply(next), Some(current)) => (next, current),
            (Transition::Reject(kind), _) => {
                tracing::warn!(stream = %key, state = ?state, "Stream deletion rejected");
                return Err(ControllerError::rejected(kind, key));
            }
            _ => {
                tracing::debug!(stream = %key, "Stream already absent");
                return Ok(false);
            }
        };

        // The stream record is committed first; membership removal follows
        // and restores the stream if it fails.
        let parent = self.scopes.get(&key.scope)?;
        let stream_version =
            self.streams
                .put(key, Some(current.version), current.value.with_state(next))?;

        if let Some(parent) = parent.filter(|p| p.value.members.contains(&key.name)) {
            let mut members = parent.value.clone();
            members.members.remove(&key.name);

            if let Err(e) = self.scopes.put(&key.scope, Some(parent.version), members) {
                if let Err(restore) = self.streams.put(key, Some(stream_version), current.value) {
                    tracing::error!(stream = %key, error = %restore, "Failed to restore stream");
                }
                return Err(e.into());
            }
        }

        tracing::info!(stream = %key, "Stream deleted");
        Ok(true)
    }

    /// Check if a scope exists and is active
    pub async fn scope_exists(&self, name: &str) -> Result<bool> {
        Ok(self.scopes.scope_exists(name)?)
    }

    /// Check if a scope has no live streams
    pub async fn is_scope_empty(&self, name: &str) -> Result<bool> {
        Ok(self.scopes.is_scope_empty(name)?)
    }

    /// Names of all active scopes, sorted
    pub async fn list_scopes(&self) -> Result<Vec<String>> {
        Ok(self.scopes.list()?)
    }

    /// Names of the live streams of an active scope, sorted
    pub async fn list_streams(&self, scope: &str) -> Result<Vec<String>> {
        match self.scopes.get(scope)? {
            Some(parent) if parent.value.is_active() => {
                Ok(parent.value.members.into_iter().collect())
            }
            _ => Err(ControllerError::ScopeNotFound {
                scope: scope.to_string(),
            }),
        }
    }

    /// Check if a stream exists and has not been deleted
    pub async fn stream_exists(&self, scope: &str, name: &str) -> Result<bool> {
        Ok(self.streams.stream_exists(&StreamKey::new(scope, name))?)
    }

    /// Get a snapshot of a stream's state, configuration and epoch
    ///
    /// Deleted streams are reported with state `Deleted` until recreated.
    pub async fn stream_info(&self, scope: &str, name: &str) -> Result<Option<StreamInfo>> {
        Ok(self.streams.info(&StreamKey::new(scope, name))?)
    }

    /// Check if a stream is active (writable)
    pub async fn is_stream_active(&self, key: &StreamKey) -> Result<bool> {
        Ok(self
            .streams
            .info(key)?
            .map_or(false, |info| info.state == StreamState::Active))
    }

    fn check_name(&self, name: &str) -> Result<()> {
        validate_name(name, self.config.max_name_length)
    }

    fn restore_scope(&self, name: &str, version: Version, previous: ScopeRecord) {
        if let Err(e) = self.scopes.put(name, Some(version), previous) {
            tracing::error!(scope = %name, error = %e, "Failed to restore scope membership");
        }
    }
}

fn scope_rejected(kind: ErrorKind, scope: &str, streams: usize) -> ControllerError {
    match kind {
        ErrorKind::ScopeNotEmpty => ControllerError::ScopeNotEmpty {
            scope: scope.to_string(),
            streams,
        },
        _ => ControllerError::ScopeNotFound {
            scope: scope.to_string(),
        },
    }
}
