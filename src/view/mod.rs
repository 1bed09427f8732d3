//! The native view tree: handles, structure, signals and hook points.

pub mod hook;
pub mod node;
pub mod signal;
pub mod tree;

pub use hook::{Hook, HookReply};
pub use node::{live_view_count, live_views, View, ViewId, ViewState, WeakView};
pub use signal::{Payload, SignalKind, Slot, SlotId};
