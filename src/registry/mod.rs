//! Scope and stream registries
//!
//! The registries are typed views over a [`MetadataStore`](crate::store::MetadataStore).
//! They read records and commit them by compare-and-set, but never decide
//! whether a transition is legal; that is the controller's job.
//!
//! # Layout
//!
//! ```text
//!                    MetadataStore
//!        ┌──────────────────────────────────────┐
//!        │ scope:A     -> ScopeRecord {         │
//!        │                  state: Active,      │
//!        │                  members: {1, 2},    │
//!        │                }                     │
//!        │ stream:A/1  -> StreamRecord {        │
//!        │                  state: Active,      │
//!        │                  config, epoch: 3,   │
//!        │                }                     │
//!        │ stream:A/2  -> StreamRecord { .. }   │
//!        │ stream:A/0  -> StreamRecord {        │
//!        │                  state: Deleted, ..  │
//!        │                }                     │
//!        └──────────────────────────────────────┘
//! ```
//!
//! Deleted streams drop out of their scope's member set but keep a tombstone
//! record.

pub mod config;
pub mod key;
pub mod scope;
pub mod stream;

pub use config::{RetentionPolicy, ScalingPolicy, StreamConfiguration};
pub use key::{validate_name, StreamKey};
pub use scope::{ScopeRecord, ScopeRegistry, ScopeState};
pub use stream::{StreamInfo, StreamRecord, StreamRegistry, StreamState};
