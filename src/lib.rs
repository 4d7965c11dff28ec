//! Scope and stream metadata control plane
//!
//! Manages the lifecycle of **scopes** (namespaces) and **streams** (named,
//! partitioned logs living inside a scope):
//!
//! ```text
//!   scope:   absent ──create──► Active ──delete (empty)──► Deleted
//!   stream:  absent ──create──► Active ──seal──► Sealed ──delete──► Deleted
//!                                 │ ▲
//!                                 └─┘ update (epoch + 1)
//! ```
//!
//! Every operation returns `true` when it changed state, `false` when the
//! desired end state already held, or a typed [`ControllerError`] when the
//! transition is illegal.
//!
//! # Example
//!
//! ```no_run
//! use streamctl::{MetadataController, ScalingPolicy, StreamConfiguration};
//!
//! # async fn example() -> streamctl::Result<()> {
//! let controller = MetadataController::new();
//!
//! controller.create_scope("examples").await?;
//! controller
//!     .create_stream("examples", "orders", StreamConfiguration::new(ScalingPolicy::fixed(4)))
//!     .await?;
//!
//! controller.seal_stream("examples", "orders").await?;
//! controller.delete_stream("examples", "orders").await?;
//! controller.delete_scope("examples").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod controller;
pub mod error;
pub mod registry;
pub mod store;
pub mod transition;

pub use client::{ClientFactory, EventWriter, WriterError};
pub use controller::{ControllerConfig, MetadataController};
pub use error::{ControllerError, ErrorKind, Result};
pub use registry::{
    RetentionPolicy, ScalingPolicy, ScopeState, StreamConfiguration, StreamInfo, StreamKey,
    StreamState,
};
pub use store::{InMemoryMetadataStore, MetadataStore};
