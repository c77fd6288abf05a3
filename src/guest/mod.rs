mod serializer;
mod state;
mod view;

pub use state::GuestState;
pub use view::{Completion, GuestView};
