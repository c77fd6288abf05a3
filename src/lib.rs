// Guest-view lifecycle management over an asynchronous host bridge.

pub mod bridge;
pub mod container;
pub mod error;
pub mod guest;

// Re-export the types embedders touch directly
pub use bridge::{
    AttachParams, AutoSizeParams, ContentWindow, CreateParams, DestructionHook, ElementResizeHook,
    ElementSize, GuestBridge, GuestId, InstanceId, ParamDict, SizeParams,
};
pub use container::{
    ContainerBehavior, DefaultBehavior, DomEvent, GuestViewContainer,
    INTERNAL_INSTANCE_ID_ATTRIBUTE,
};
pub use error::GuestViewError;
pub use guest::{Completion, GuestState, GuestView};
