//! Input model and routing.

pub mod input;
pub mod window;

pub use input::{Key, PointerButton, PointerEvent, ScrollEvent};
pub use window::{TouchscreenKeyboardPolicy, Window};
