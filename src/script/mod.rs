//! Lua bridge: exposes the native view tree to scripts.
//!
//! - [`convert`]: native values to and from Lua values
//! - [`companion`]: per-view script data, child pins, hook overrides
//! - [`forward`]: native signals into ordered script callback lists
//! - [`expose`]: view methods and widget factories
//! - [`composite`]: factories of scroll areas, pages, rich text, lists and drag areas
//! - [`resolver`]: `setStyle` tables into ordered rules
//! - [`engine`]: the host entry point

pub mod animator;
pub mod companion;
pub mod composite;
pub mod convert;
pub mod dump;
pub mod engine;
pub mod enums;
pub mod expose;
pub mod forward;
pub mod future;
pub mod globals;
pub mod handle;
pub mod resolver;
pub mod rules;

pub use companion::{Companion, CompanionKey};
pub use engine::{EngineConfig, ScriptEngine};
pub use forward::SIGNAL_REMOVE;
pub use future::{FutureCompleter, ScriptFuture, ScriptValue};
pub use handle::ViewHandle;
pub use resolver::StyleResolver;
