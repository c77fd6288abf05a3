use thiserror::Error;

use crate::guest::GuestState;

/// Failures surfaced through an operation's [`Completion`](crate::Completion).
///
/// Lifecycle operations never panic and never leave a completion unresolved:
/// a call made from the wrong state resolves with [`InvalidState`] and a
/// host-side refusal resolves with [`CreateFailed`] / [`AttachFailed`] after
/// the guest has been rolled back to its pre-operation state.
///
/// [`InvalidState`]: GuestViewError::InvalidState
/// [`CreateFailed`]: GuestViewError::CreateFailed
/// [`AttachFailed`]: GuestViewError::AttachFailed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestViewError {
    #[error("`{operation}` is not valid while the guest is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: GuestState,
    },
    #[error("the host failed to create the guest")]
    CreateFailed,
    #[error("the host failed to attach the guest")]
    AttachFailed,
    #[error("the guest view was dropped before the operation ran")]
    ViewClosed,
}
