#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::oneshot;
use tokio::time::sleep;

use guestview::{
    AttachParams, AutoSizeParams, ContentWindow, CreateParams, DestructionHook, ElementResizeHook,
    ElementSize, GuestBridge, GuestId, GuestState, GuestView, InstanceId, SizeParams,
};

/// One recorded bridge invocation, in the order the bridge saw them.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    CreateGuest {
        view_type: String,
        params: CreateParams,
    },
    AttachGuest {
        instance: InstanceId,
        guest: GuestId,
        params: AttachParams,
    },
    DetachGuest {
        instance: InstanceId,
    },
    DestroyGuest {
        guest: GuestId,
    },
    SetAutoSize {
        guest: GuestId,
        params: AutoSizeParams,
    },
    SetSize {
        guest: GuestId,
        params: SizeParams,
    },
}

#[derive(Default)]
struct Inner {
    calls: Vec<BridgeCall>,
    next_guest_id: u32,
    create_results: VecDeque<GuestId>,
    attach_results: VecDeque<Option<ContentWindow>>,
    create_gates: VecDeque<oneshot::Receiver<()>>,
    attach_gates: VecDeque<oneshot::Receiver<()>>,
}

/// In-process stand-in for the privileged host bridge. Responses can be
/// scripted per call (failures, gated latency) and every invocation is
/// recorded for ordering assertions.
#[derive(Default)]
pub struct FakeBridge {
    inner: Mutex<Inner>,
    destruction_hooks: Mutex<Vec<(InstanceId, DestructionHook)>>,
    resize_hooks: Mutex<Vec<(InstanceId, ElementResizeHook)>>,
}

/// Route library logs into the test output, honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl FakeBridge {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Next create_guest reply is a zero id (creation failure).
    pub fn queue_create_failure(&self) {
        self.inner
            .lock()
            .unwrap()
            .create_results
            .push_back(GuestId::NONE);
    }

    /// Next attach_guest reply is `None` (attach failure).
    pub fn queue_attach_failure(&self) {
        self.inner.lock().unwrap().attach_results.push_back(None);
    }

    /// Hold the next create_guest future until the returned sender fires.
    pub fn gate_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().create_gates.push_back(rx);
        tx
    }

    /// Hold the next attach_guest future until the returned sender fires.
    pub fn gate_next_attach(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().attach_gates.push_back(rx);
        tx
    }

    pub fn has_destruction_hook(&self, instance: InstanceId) -> bool {
        self.destruction_hooks
            .lock()
            .unwrap()
            .iter()
            .any(|(i, _)| *i == instance)
    }

    pub fn has_resize_hook(&self, instance: InstanceId) -> bool {
        self.resize_hooks
            .lock()
            .unwrap()
            .iter()
            .any(|(i, _)| *i == instance)
    }

    /// Simulate the host tearing the plugin element down. Returns whether a
    /// hook was registered for `instance`.
    pub fn fire_destruction(&self, instance: InstanceId) -> bool {
        let hook = {
            let mut hooks = self.destruction_hooks.lock().unwrap();
            hooks
                .iter()
                .position(|(i, _)| *i == instance)
                .map(|idx| hooks.remove(idx).1)
        };
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    /// Simulate an element resize notification from the host. Returns
    /// whether any hook fired.
    pub fn fire_element_resize(&self, instance: InstanceId, old: ElementSize, new: ElementSize) -> bool {
        // Take matching hooks out before invoking them: a hook may call
        // back into the bridge (set_size).
        let hooks = std::mem::take(&mut *self.resize_hooks.lock().unwrap());
        let mut fired = false;
        for (i, hook) in &hooks {
            if *i == instance {
                hook(old, new);
                fired = true;
            }
        }
        self.resize_hooks.lock().unwrap().extend(hooks);
        fired
    }
}

impl GuestBridge for FakeBridge {
    fn create_guest(&self, view_type: &str, params: CreateParams) -> BoxFuture<'static, GuestId> {
        let (id, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(BridgeCall::CreateGuest {
                view_type: view_type.to_string(),
                params,
            });
            let id = match inner.create_results.pop_front() {
                Some(id) => id,
                None => {
                    inner.next_guest_id += 1;
                    GuestId::new(inner.next_guest_id)
                }
            };
            (id, inner.create_gates.pop_front())
        };
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            id
        }
        .boxed()
    }

    fn attach_guest(
        &self,
        instance: InstanceId,
        guest: GuestId,
        params: AttachParams,
    ) -> BoxFuture<'static, Option<ContentWindow>> {
        let (window, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(BridgeCall::AttachGuest {
                instance,
                guest,
                params,
            });
            let window = match inner.attach_results.pop_front() {
                Some(window) => window,
                None => Some(ContentWindow::new(u64::from(instance.raw()))),
            };
            (window, inner.attach_gates.pop_front())
        };
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            window
        }
        .boxed()
    }

    fn detach_guest(&self, instance: InstanceId) -> BoxFuture<'static, ()> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(BridgeCall::DetachGuest { instance });
        async move {}.boxed()
    }

    fn destroy_guest(&self, guest: GuestId) -> BoxFuture<'static, ()> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(BridgeCall::DestroyGuest { guest });
        async move {}.boxed()
    }

    fn set_auto_size(&self, guest: GuestId, params: AutoSizeParams) -> BoxFuture<'static, ()> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(BridgeCall::SetAutoSize { guest, params });
        async move {}.boxed()
    }

    fn set_size(&self, guest: GuestId, params: SizeParams) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(BridgeCall::SetSize { guest, params });
    }

    fn register_destruction_callback(&self, instance: InstanceId, on_destroyed: DestructionHook) {
        self.destruction_hooks
            .lock()
            .unwrap()
            .push((instance, on_destroyed));
    }

    fn register_element_resize_callback(&self, instance: InstanceId, on_resize: ElementResizeHook) {
        self.resize_hooks
            .lock()
            .unwrap()
            .push((instance, on_resize));
    }
}

/// Poll until the guest reaches `state`; panics after ~500ms.
pub async fn wait_for_state(guest: &GuestView, state: GuestState) {
    for _ in 0..100 {
        if guest.state() == state {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "guest never reached {:?}, still {:?}",
        state,
        guest.state()
    );
}

/// Check the cross-field consistency of a guest's observable state.
pub fn assert_guest_consistent(guest: &GuestView) {
    let state = guest.state();
    assert_eq!(
        state == GuestState::Start,
        guest.id().is_none(),
        "a guest has a host id exactly when it has left Start (state {:?}, id {})",
        state,
        guest.id()
    );
    assert_eq!(
        state == GuestState::Attached,
        guest.content_window().is_some(),
        "a content window exists exactly while attached (state {:?})",
        state
    );
    if state == GuestState::Attached {
        assert!(
            !guest.internal_instance_id().is_none(),
            "an attached guest must be bound to a plugin element"
        );
    }
}
