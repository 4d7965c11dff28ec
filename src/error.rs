//! Error types
//!
//! Every control-plane operation either returns a `bool` (`true` when the
//! requested transition was applied, `false` when the desired end state
//! already holds) or fails with a [`ControllerError`].

use crate::registry::StreamKey;
use crate::store::StoreError;

/// Result type for control-plane operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Classification of a rejected transition
///
/// This is what the transition table produces; the controller attaches the
/// entity identity to build a [`ControllerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parent scope absent or deleted
    ScopeNotFound,
    /// Scope still has live streams
    ScopeNotEmpty,
    /// Stream is not in the Active state
    StreamNotActive,
    /// Stream is not in the Sealed state
    StreamNotSealed,
}

/// Error type for control-plane operations
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Stream creation targeted a scope that does not exist
    #[error("Scope not found: {scope}")]
    ScopeNotFound { scope: String },

    /// Scope deletion attempted while live streams remain
    #[error("Scope not empty: {scope} ({streams} live streams)")]
    ScopeNotEmpty { scope: String, streams: usize },

    /// Update or seal attempted on a stream that is not Active
    #[error("Stream not active: {stream}")]
    StreamNotActive { stream: StreamKey },

    /// Delete attempted on a stream that is not Sealed
    #[error("Stream not sealed: {stream}")]
    StreamNotSealed { stream: StreamKey },

    /// Malformed scope or stream name
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Malformed stream configuration
    #[error("Invalid stream configuration: {0}")]
    InvalidConfiguration(String),

    /// The metadata store failed or rejected a write
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ControllerError {
    /// Build the error for a rejected stream transition
    pub(crate) fn rejected(kind: ErrorKind, key: &StreamKey) -> Self {
        match kind {
            ErrorKind::ScopeNotFound => ControllerError::ScopeNotFound {
                scope: key.scope.clone(),
            },
            ErrorKind::ScopeNotEmpty => ControllerError::ScopeNotEmpty {
                scope: key.scope.clone(),
                streams: 0,
            },
            ErrorKind::StreamNotActive => ControllerError::StreamNotActive {
                stream: key.clone(),
            },
            ErrorKind::StreamNotSealed => ControllerError::StreamNotSealed {
                stream: key.clone(),
            },
        }
    }

    /// The transition-table classification of this error, if it has one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ControllerError::ScopeNotFound { .. } => Some(ErrorKind::ScopeNotFound),
            ControllerError::ScopeNotEmpty { .. } => Some(ErrorKind::ScopeNotEmpty),
            ControllerError::StreamNotActive { .. } => Some(ErrorKind::StreamNotActive),
            ControllerError::StreamNotSealed { .. } => Some(ErrorKind::StreamNotSealed),
            ControllerError::InvalidName { .. }
            | ControllerError::InvalidConfiguration(_)
            | ControllerError::Store(_) => None,
        }
    }
}
