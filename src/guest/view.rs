//! The public guest façade.
//!
//! A `GuestView` is a cheap handle onto one guest's action queue and shared
//! state record. Every lifecycle method enqueues its action synchronously at
//! call time, so issue order is preserved even when callers never await the
//! returned [`Completion`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};

use crate::bridge::{
    AttachParams, AutoSizeParams, ContentWindow, CreateParams, GuestBridge, GuestId, InstanceId,
};
use crate::error::GuestViewError;
use crate::guest::serializer::{Action, ActionSerializer, CompletionSender};
use crate::guest::state::{GuestCore, GuestState};

/// Resolves exactly once, after the serializer has fully applied the
/// operation's state transition. Dropping it makes the operation
/// fire-and-forget; the action still runs.
pub struct Completion {
    rx: oneshot::Receiver<Result<(), GuestViewError>>,
}

impl Future for Completion {
    type Output = Result<(), GuestViewError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(GuestViewError::ViewClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Handle to one guest. Clones share the same guest; the backing serializer
/// task exits once every clone is dropped and the queue has drained.
#[derive(Clone)]
pub struct GuestView {
    actions: mpsc::UnboundedSender<Action>,
    core: Arc<Mutex<GuestCore>>,
    view_type: Arc<str>,
}

impl GuestView {
    /// Allocate a fresh guest in `Start` state and spawn its serializer
    /// task. Must be called from within a tokio runtime.
    pub fn new(bridge: Arc<dyn GuestBridge>, view_type: impl Into<String>) -> Self {
        let view_type = view_type.into();
        let core = Arc::new(Mutex::new(GuestCore::new()));
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();

        let serializer =
            ActionSerializer::new(bridge, Arc::clone(&core), view_type.clone(), actions_rx);
        tokio::spawn(serializer.run());

        GuestView {
            actions: actions_tx,
            core,
            view_type: view_type.into(),
        }
    }

    /// Request a new host-side guest of this view's type. Valid from
    /// `Start`; on host refusal (id of zero) the state stays `Start` and
    /// the completion resolves `Err(CreateFailed)`.
    pub fn create(&self, params: CreateParams) -> Completion {
        self.submit(|done| Action::Create { params, done })
    }

    /// Bind the guest to a plugin element handle and ask the host to render
    /// into it. Valid from `Created`. Registers the host-destruction hook
    /// for `instance` before the attach call is issued.
    pub fn attach(&self, instance: InstanceId, params: AttachParams) -> Completion {
        self.submit(|done| Action::Attach {
            instance,
            params,
            done,
        })
    }

    /// Unbind the plugin element without destroying the host-side guest.
    /// Valid from `Attached`.
    pub fn detach(&self) -> Completion {
        self.submit(|done| Action::Detach { done })
    }

    /// Tear the guest down unconditionally. A destroy in `Start` is a
    /// success no-op; from any other state exactly one bridge destroy call
    /// is issued and the guest returns to `Start`.
    pub fn destroy(&self) -> Completion {
        self.submit(|done| Action::Destroy { done })
    }

    /// Forward auto-sizing preferences to the host. Valid from `Created`
    /// or `Attached`; no state change.
    pub fn set_auto_size(&self, params: AutoSizeParams) -> Completion {
        self.submit(|done| Action::SetAutoSize { params, done })
    }

    pub fn id(&self) -> GuestId {
        self.core.lock().unwrap().id
    }

    pub fn state(&self) -> GuestState {
        self.core.lock().unwrap().state
    }

    pub fn content_window(&self) -> Option<ContentWindow> {
        self.core.lock().unwrap().content_window.clone()
    }

    pub fn internal_instance_id(&self) -> InstanceId {
        self.core.lock().unwrap().internal_instance_id
    }

    pub fn view_type(&self) -> &str {
        &self.view_type
    }

    fn submit(&self, build: impl FnOnce(CompletionSender) -> Action) -> Completion {
        let (tx, rx) = oneshot::channel();
        // A failed send drops the action together with its sender; the
        // returned completion then resolves with ViewClosed.
        let _ = self.actions.send(build(tx));
        Completion { rx }
    }
}
