//! Binding between a host DOM element and a [`GuestView`].
//!
//! The container owns the synthetic plugin-element record, turns element
//! lifecycle and attribute-mutation signals into lifecycle operations, and
//! re-exposes guest resize activity as ordinary DOM-style events on an
//! outbound channel.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::bridge::{AttachParams, CreateParams, ElementSize, GuestBridge, InstanceId, SizeParams};
use crate::guest::{Completion, GuestView};

/// Attribute through which the plugin element reports the instance id the
/// host assigned to it.
pub const INTERNAL_INSTANCE_ID_ATTRIBUTE: &str = "internalinstanceid";

/// Events re-dispatched on the host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Resize {
        old_width: u32,
        old_height: u32,
        new_width: u32,
        new_height: u32,
    },
    ContentResize {
        old_width: u32,
        old_height: u32,
        new_width: u32,
        new_height: u32,
    },
}

/// Per-variant customization of a container. Every method has a default
/// no-op so a variant only overrides what it needs.
pub trait ContainerBehavior: Send + 'static {
    /// Extra parameters merged into every create/attach request.
    fn build_container_params(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Attribute mutations on the host element other than instance-id
    /// discovery.
    fn handle_attribute_mutation(&mut self, _name: &str, _old: Option<&str>, _new: Option<&str>) {}

    /// The host element was inserted into the document.
    fn on_element_attached(&mut self) {}
}

/// Behavior with all defaults, for guest views without variant hooks.
#[derive(Debug, Default)]
pub struct DefaultBehavior;

impl ContainerBehavior for DefaultBehavior {}

pub struct GuestViewContainer<B: ContainerBehavior> {
    guest: GuestView,
    bridge: Arc<dyn GuestBridge>,
    behavior: B,
    internal_instance_id: InstanceId,
    events: mpsc::UnboundedSender<DomEvent>,
}

impl<B: ContainerBehavior> GuestViewContainer<B> {
    /// Allocate a fresh guest in `Start` state together with the outbound
    /// event stream. Must be called from within a tokio runtime.
    pub fn new(
        bridge: Arc<dyn GuestBridge>,
        view_type: impl Into<String>,
        behavior: B,
    ) -> (Self, mpsc::UnboundedReceiver<DomEvent>) {
        let guest = GuestView::new(Arc::clone(&bridge), view_type);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let container = GuestViewContainer {
            guest,
            bridge,
            behavior,
            internal_instance_id: InstanceId::NONE,
            events: events_tx,
        };
        (container, events_rx)
    }

    pub fn guest(&self) -> &GuestView {
        &self.guest
    }

    pub fn internal_instance_id(&self) -> InstanceId {
        self.internal_instance_id
    }

    /// Request guest creation with the variant's container params merged in.
    pub fn create(&self, mut params: CreateParams) -> Completion {
        params.merge(self.behavior.build_container_params());
        self.guest.create(params)
    }

    /// Attribute mutation reported by the plugin element. Discovery of
    /// `internalinstanceid` registers the element-resize hook and, if the
    /// guest already has a host id, immediately issues an attach; any other
    /// attribute is forwarded to the variant behavior.
    pub fn handle_plugin_attribute_mutation(
        &mut self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        if name != INTERNAL_INSTANCE_ID_ATTRIBUTE {
            self.behavior.handle_attribute_mutation(name, old, new);
            return;
        }

        // Only the first transition from unset to a concrete id counts.
        if old.is_some_and(|v| !v.is_empty()) {
            return;
        }
        // Attribute removal is an ordinary DOM signal, not a parse error.
        let Some(value) = new else {
            return;
        };
        let instance = match value.parse::<u32>().ok().filter(|raw| *raw != 0) {
            Some(raw) => InstanceId::new(raw),
            None => {
                tracing::warn!(
                    target: "guestview",
                    value,
                    "ignoring unparsable plugin instance id"
                );
                return;
            }
        };

        self.internal_instance_id = instance;
        self.register_element_resize_hook(instance);

        if self.guest.id().is_none() {
            // create() has not completed yet; attach happens through
            // attach_window() once it has.
            return;
        }
        let _ = self.attach_internal();
    }

    /// Explicit request to (re)attach using the currently known plugin
    /// handle. Returns `false` without side effects when no handle exists.
    pub fn attach_window(&mut self) -> bool {
        if self.internal_instance_id.is_none() {
            return false;
        }
        let _ = self.attach_internal();
        true
    }

    /// The host element was inserted into the document.
    pub fn element_attached(&mut self) {
        self.behavior.on_element_attached();
    }

    /// The host element was removed from the document. This is the one
    /// place the UI layer triggers guest teardown.
    pub fn element_detached(&mut self) -> Completion {
        self.guest.destroy()
    }

    /// Guest-content size change (auto-size activity); re-dispatched as a
    /// `contentresize` event.
    pub fn notify_content_resize(&self, old: ElementSize, new: ElementSize) {
        let _ = self.events.send(DomEvent::ContentResize {
            old_width: old.width,
            old_height: old.height,
            new_width: new.width,
            new_height: new.height,
        });
    }

    fn attach_internal(&mut self) -> Completion {
        let mut params = AttachParams::new();
        params.merge(self.behavior.build_container_params());
        self.guest.attach(self.internal_instance_id, params)
    }

    fn register_element_resize_hook(&self, instance: InstanceId) {
        let events = self.events.clone();
        let guest = self.guest.clone();
        // The hook is stored inside the bridge itself; a strong reference
        // here would keep the bridge alive through its own registry.
        let bridge = Arc::downgrade(&self.bridge);
        self.bridge.register_element_resize_callback(
            instance,
            Box::new(move |old, new| {
                let _ = events.send(DomEvent::Resize {
                    old_width: old.width,
                    old_height: old.height,
                    new_width: new.width,
                    new_height: new.height,
                });
                let guest_id = guest.id();
                if guest_id.is_none() {
                    return;
                }
                if let Some(bridge) = bridge.upgrade() {
                    bridge.set_size(
                        guest_id,
                        SizeParams {
                            width: new.width,
                            height: new.height,
                        },
                    );
                }
            }),
        );
    }
}
