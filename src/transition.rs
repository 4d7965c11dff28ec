//! Lifecycle transition tables
//!
//! Each control-plane operation is looked up against the current state of
//! its target and resolves to one of three outcomes: apply a new state, do
//! nothing (the desired end state already holds), or reject with a typed
//! error.
//!
//! Create and delete behave like set membership and are idempotent once the
//! target state is reached. Seal is a one-shot transition and is never
//! replayed.
//!
//! | Entity | Current          | Operation | Outcome                  |
//! |--------|------------------|-----------|--------------------------|
//! | scope  | absent / Deleted | create    | Active                   |
//! | scope  | Active           | create    | no-op                    |
//! | scope  | Active, empty    | delete    | Deleted                  |
//! | scope  | Active, members  | delete    | `ScopeNotEmpty`          |
//! | scope  | absent / Deleted | delete    | no-op                    |
//! | stream | absent           | create    | Active                   |
//! | stream | Active / Sealed  | create    | no-op                    |
//! | stream | Deleted          | create    | Active if names are reusable, else no-op |
//! | stream | Active           | update    | Active (epoch + 1)       |
//! | stream | other            | update    | `StreamNotActive`        |
//! | stream | Active           | seal      | Sealed                   |
//! | stream | other            | seal      | `StreamNotActive`        |
//! | stream | Sealed           | delete    | Deleted                  |
//! | stream | Active           | delete    | `StreamNotSealed`        |
//! | stream | absent / Deleted | delete    | no-op                    |

use crate::error::ErrorKind;
use crate::registry::{ScopeState, StreamState};

/// Operations on a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeOp {
    Create,
    Delete,
}

/// Operations on a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOp {
    Create,
    Update,
    Seal,
    Delete,
}

/// Outcome of looking up an operation in a transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Move the entity to this state
    Apply(S),
    /// Desired end state already holds
    NoOp,
    /// Operation is illegal in the current state
    Reject(ErrorKind),
}

/// Look up a scope operation
///
/// `has_members` is only consulted for deletion of an active scope.
pub fn scope_transition(
    current: Option<ScopeState>,
    op: ScopeOp,
    has_members: bool,
) -> Transition<ScopeState> {
    use ScopeState::*;

    match (current, op) {
        (None | Some(Deleted), ScopeOp::Create) => Transition::Apply(Active),
        (Some(Active), ScopeOp::Create) => Transition::NoOp,
        (Some(Active), ScopeOp::Delete) if has_members => {
            Transition::Reject(ErrorKind::ScopeNotEmpty)
        }
        (Some(Active), ScopeOp::Delete) => Transition::Apply(Deleted),
        (None | Some(Deleted), ScopeOp::Delete) => Transition::NoOp,
    }
}

/// Look up a stream operation
///
/// `name_reuse` decides whether a deleted stream's name may be created again.
pub fn stream_transition(
    current: Option<StreamState>,
    op: StreamOp,
    name_reuse: bool,
) -> Transition<StreamState> {
    use StreamState::*;

    match (current, op) {
        (None, StreamOp::Create) => Transition::Apply(Active),
        (Some(Deleted), StreamOp::Create) if name_reuse => Transition::Apply(Active),
        (Some(_), StreamOp::Create) => Transition::NoOp,

        (Some(Active), StreamOp::Update) => Transition::Apply(Active),
        (_, StreamOp::Update) => Transition::Reject(ErrorKind::StreamNotActive),

        (Some(Active), StreamOp::Seal) => Transition::Apply(Sealed),
        (_, StreamOp::Seal) => Transition::Reject(ErrorKind::StreamNotActive),

        (Some(Sealed), StreamOp::Delete) => Transition::Apply(Deleted),
        (Some(Active), StreamOp::Delete) => Transition::Reject(ErrorKind::StreamNotSealed),
        (None | Some(Deleted), StreamOp::Delete) => Transition::NoOp,
    }
}
