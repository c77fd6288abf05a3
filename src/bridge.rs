//! The privileged host bridge boundary.
//!
//! Everything that actually creates, attaches, resizes, or destroys a guest's
//! rendering surface lives on the other side of [`GuestBridge`]. This module
//! only defines the trait and the wire-level handle/parameter types; the
//! embedder supplies the implementation.

use std::fmt;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host-assigned handle for a guest. Zero means "no guest yet" and doubles
/// as the bridge's creation-failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(u32);

impl GuestId {
    pub const NONE: GuestId = GuestId(0);

    pub fn new(raw: u32) -> Self {
        GuestId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of the DOM-side plugin element a guest renders into. Zero means
/// unbound. Independent of [`GuestId`]: a guest can exist with no element
/// and an element can exist with no guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u32);

impl InstanceId {
    pub const NONE: InstanceId = InstanceId(0);

    pub fn new(raw: u32) -> Self {
        InstanceId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque window-proxy handle produced by a successful attach. Only valid
/// while the guest stays attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentWindow(u64);

impl ContentWindow {
    pub fn new(routing_id: u64) -> Self {
        ContentWindow(routing_id)
    }

    pub fn routing_id(&self) -> u64 {
        self.0
    }
}

/// Open dictionary of creation/attachment parameters, forwarded to the host
/// verbatim. Containers merge their variant-specific entries on top of
/// whatever the caller supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamDict(Map<String, Value>);

impl ParamDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Merge `extra` into this dictionary; entries in `extra` win.
    pub fn merge(&mut self, extra: Map<String, Value>) {
        for (key, value) in extra {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ParamDict {
    fn from(map: Map<String, Value>) -> Self {
        ParamDict(map)
    }
}

pub type CreateParams = ParamDict;
pub type AttachParams = ParamDict;

/// Width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: u32,
    pub height: u32,
}

impl ElementSize {
    pub fn new(width: u32, height: u32) -> Self {
        ElementSize { width, height }
    }
}

/// Auto-sizing preferences forwarded to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSizeParams {
    pub enable_auto_size: bool,
    pub min: ElementSize,
    pub max: ElementSize,
}

/// Explicit size forwarded through the fire-and-forget `set_size` path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeParams {
    pub width: u32,
    pub height: u32,
}

/// Invoked by the host when it tears the plugin element down without an
/// explicit detach or destroy request from this side.
pub type DestructionHook = Box<dyn FnOnce() + Send>;

/// Invoked by the host when the plugin element's size changes:
/// `(old_size, new_size)`.
pub type ElementResizeHook = Box<dyn Fn(ElementSize, ElementSize) + Send + Sync>;

/// Asynchronous privileged API that owns the actual guest surfaces.
///
/// Every method except `set_size` completes through the returned future.
/// Failure is signaled in-band: `create_guest` yields [`GuestId::NONE`] and
/// `attach_guest` yields `None`; `destroy_guest`, `detach_guest`, and
/// `set_auto_size` cannot fail.
pub trait GuestBridge: Send + Sync + 'static {
    fn create_guest(&self, view_type: &str, params: CreateParams) -> BoxFuture<'static, GuestId>;

    fn attach_guest(
        &self,
        instance: InstanceId,
        guest: GuestId,
        params: AttachParams,
    ) -> BoxFuture<'static, Option<ContentWindow>>;

    fn detach_guest(&self, instance: InstanceId) -> BoxFuture<'static, ()>;

    fn destroy_guest(&self, guest: GuestId) -> BoxFuture<'static, ()>;

    fn set_auto_size(&self, guest: GuestId, params: AutoSizeParams) -> BoxFuture<'static, ()>;

    /// Fire-and-forget; no completion is consumed.
    fn set_size(&self, guest: GuestId, params: SizeParams);

    fn register_destruction_callback(&self, instance: InstanceId, on_destroyed: DestructionHook);

    fn register_element_resize_callback(&self, instance: InstanceId, on_resize: ElementResizeHook);
}
