//! The per-guest state machine.
//!
//! Preconditions are evaluated when an action is dequeued and run, not when
//! it is enqueued. That is what makes `create(); attach();` issued
//! back-to-back legal: by the time attach executes, create has completed and
//! the guest is `Created`.

use crate::bridge::{ContentWindow, GuestId, InstanceId};
use crate::error::GuestViewError;

const MSG_ALREADY_CREATED: &str = "The guest has already been created.";
const MSG_ALREADY_ATTACHED: &str = "The guest has already been attached.";
const MSG_NOT_CREATED: &str = "The guest has not been created.";
const MSG_NOT_ATTACHED: &str = "The guest is not attached.";
const MSG_INVALID_STATE: &str = "The guest is in an invalid state.";

/// Logical lifecycle state of one guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestState {
    /// No guest instance exists in the host.
    Start,
    /// A host-side guest exists but is not visually attached.
    Created,
    /// Bound to a live plugin element and rendering.
    Attached,
}

/// Lifecycle operations subject to precondition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Create,
    Attach,
    Detach,
    Destroy,
    SetAutoSize,
}

impl Operation {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Attach => "attach",
            Operation::Detach => "detach",
            Operation::Destroy => "destroy",
            Operation::SetAutoSize => "set_auto_size",
        }
    }
}

/// Validate `operation` against the current state. An invalid call is a
/// programming error on the caller's side: it is logged with the violated
/// precondition and reported back as [`GuestViewError::InvalidState`]
/// without any bridge traffic.
pub(crate) fn check_operation(
    operation: Operation,
    state: GuestState,
) -> Result<(), GuestViewError> {
    let allowed = match operation {
        Operation::Create => state == GuestState::Start,
        Operation::Attach => state == GuestState::Created,
        Operation::Detach => state == GuestState::Attached,
        // Destroy from Start is handled as a no-op before this check.
        Operation::Destroy => true,
        Operation::SetAutoSize => matches!(state, GuestState::Created | GuestState::Attached),
    };
    if allowed {
        return Ok(());
    }

    let message = match (operation, state) {
        (Operation::Create, _) => MSG_ALREADY_CREATED,
        (Operation::Attach, GuestState::Start) => MSG_NOT_CREATED,
        (Operation::Attach, _) => MSG_ALREADY_ATTACHED,
        (Operation::Detach, _) => MSG_NOT_ATTACHED,
        (Operation::SetAutoSize, _) => MSG_NOT_CREATED,
        (Operation::Destroy, _) => MSG_INVALID_STATE,
    };
    tracing::error!(
        target: "guestview",
        operation = operation.name(),
        state = ?state,
        "{}",
        message
    );
    Err(GuestViewError::InvalidState {
        operation: operation.name(),
        state,
    })
}

/// The single mutable record for one guest. Shared between the action
/// serializer, the synchronous accessors, and the host-destruction hook;
/// the serializer never holds the lock across a bridge await.
#[derive(Debug)]
pub(crate) struct GuestCore {
    pub state: GuestState,
    pub id: GuestId,
    pub internal_instance_id: InstanceId,
    pub content_window: Option<ContentWindow>,
}

impl GuestCore {
    pub(crate) fn new() -> Self {
        GuestCore {
            state: GuestState::Start,
            id: GuestId::NONE,
            internal_instance_id: InstanceId::NONE,
            content_window: None,
        }
    }

    /// Full teardown: back to `Start` with every handle cleared.
    pub(crate) fn reset(&mut self) {
        *self = GuestCore::new();
    }

    /// Unbind from the plugin element, keeping the host-side guest alive.
    /// Used by detach and by the host-destruction hook.
    pub(crate) fn rollback_to_created(&mut self) {
        self.internal_instance_id = InstanceId::NONE;
        self.content_window = None;
        if self.state == GuestState::Attached {
            self.state = GuestState::Created;
        }
    }
}
