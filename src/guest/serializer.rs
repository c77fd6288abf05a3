//! FIFO action serializer: at most one in-flight lifecycle operation per
//! guest, executed strictly in the order the caller issued them.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use crate::bridge::{
    AttachParams, AutoSizeParams, CreateParams, GuestBridge, GuestId, InstanceId,
};
use crate::error::GuestViewError;
use crate::guest::state::{check_operation, GuestCore, GuestState, Operation};

pub(crate) type CompletionSender = oneshot::Sender<Result<(), GuestViewError>>;

/// One queued lifecycle operation. Each variant carries the caller's
/// completion sender; every dequeued action resolves it exactly once.
pub(crate) enum Action {
    Create {
        params: CreateParams,
        done: CompletionSender,
    },
    Attach {
        instance: InstanceId,
        params: AttachParams,
        done: CompletionSender,
    },
    Detach {
        done: CompletionSender,
    },
    Destroy {
        done: CompletionSender,
    },
    SetAutoSize {
        params: AutoSizeParams,
        done: CompletionSender,
    },
}

pub(crate) struct ActionSerializer {
    bridge: Arc<dyn GuestBridge>,
    core: Arc<Mutex<GuestCore>>,
    view_type: String,
    actions: mpsc::UnboundedReceiver<Action>,
}

impl ActionSerializer {
    pub(crate) fn new(
        bridge: Arc<dyn GuestBridge>,
        core: Arc<Mutex<GuestCore>>,
        view_type: String,
        actions: mpsc::UnboundedReceiver<Action>,
    ) -> Self {
        ActionSerializer {
            bridge,
            core,
            view_type,
            actions,
        }
    }

    /// Drive the queue until every `GuestView` handle is gone and the
    /// remaining actions have drained. The next action is not dequeued
    /// until the current one has completed and resolved its sender, which
    /// is the whole mutual-exclusion guarantee.
    pub(crate) async fn run(mut self) {
        while let Some(action) = self.actions.recv().await {
            self.perform(action).await;
        }
    }

    async fn perform(&mut self, action: Action) {
        // Senders whose receiver was dropped are fire-and-forget callers.
        match action {
            Action::Create { params, done } => {
                let _ = done.send(self.create(params).await);
            }
            Action::Attach {
                instance,
                params,
                done,
            } => {
                let _ = done.send(self.attach(instance, params).await);
            }
            Action::Detach { done } => {
                let _ = done.send(self.detach().await);
            }
            Action::Destroy { done } => {
                let _ = done.send(self.destroy().await);
            }
            Action::SetAutoSize { params, done } => {
                let _ = done.send(self.set_auto_size(params).await);
            }
        }
    }

    async fn create(&mut self, params: CreateParams) -> Result<(), GuestViewError> {
        {
            let core = self.core.lock().unwrap();
            check_operation(Operation::Create, core.state)?;
        }

        let id = self.bridge.create_guest(&self.view_type, params).await;

        let mut core = self.core.lock().unwrap();
        if id.is_none() {
            core.reset();
            return Err(GuestViewError::CreateFailed);
        }
        core.id = id;
        core.state = GuestState::Created;
        Ok(())
    }

    async fn attach(
        &mut self,
        instance: InstanceId,
        params: AttachParams,
    ) -> Result<(), GuestViewError> {
        let guest_id = {
            let core = self.core.lock().unwrap();
            check_operation(Operation::Attach, core.state)?;
            core.id
        };

        // The host may tear the plugin element down without a detach or
        // destroy from this side; the hook pulls the guest back to Created
        // out of band, and the next queued action tolerates that.
        let hook_core = Arc::clone(&self.core);
        self.bridge.register_destruction_callback(
            instance,
            Box::new(move || {
                let mut core = hook_core.lock().unwrap();
                // A hook can outlive its binding: detach-then-reattach
                // leaves the old element's hook registered with the host.
                // Only the element currently bound may roll the guest back.
                if core.internal_instance_id == instance {
                    core.rollback_to_created();
                }
            }),
        );

        match self.bridge.attach_guest(instance, guest_id, params).await {
            Some(window) => {
                let mut core = self.core.lock().unwrap();
                core.state = GuestState::Attached;
                core.content_window = Some(window);
                core.internal_instance_id = instance;
                Ok(())
            }
            None => {
                let mut core = self.core.lock().unwrap();
                core.content_window = None;
                core.internal_instance_id = InstanceId::NONE;
                Err(GuestViewError::AttachFailed)
            }
        }
    }

    async fn detach(&mut self) -> Result<(), GuestViewError> {
        let instance = {
            let mut core = self.core.lock().unwrap();
            check_operation(Operation::Detach, core.state)?;
            let instance = core.internal_instance_id;
            core.rollback_to_created();
            instance
        };

        self.bridge.detach_guest(instance).await;
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), GuestViewError> {
        let guest_id = {
            let mut core = self.core.lock().unwrap();
            if core.state == GuestState::Start {
                // Destroying a guest that was never created (or is already
                // gone) is a success no-op, not an error.
                return Ok(());
            }
            check_operation(Operation::Destroy, core.state)?;
            let id = core.id;
            core.reset();
            id
        };

        self.bridge.destroy_guest(guest_id).await;
        Ok(())
    }

    async fn set_auto_size(&mut self, params: AutoSizeParams) -> Result<(), GuestViewError> {
        let guest_id: GuestId = {
            let core = self.core.lock().unwrap();
            check_operation(Operation::SetAutoSize, core.state)?;
            core.id
        };

        self.bridge.set_auto_size(guest_id, params).await;
        Ok(())
    }
}
