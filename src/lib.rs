//! # gilt-script
//!
//! A Lua scripting bridge for a retained widget tree. Scripts build views
//! through global factories, subscribe to native signals, override behaviour
//! per instance and style views with declaration tables.
//!
//! ## Core Systems
//!
//! - **[`view`]**: Shared view handles, tree structure, native signals, hook points
//! - **[`widgets`]**: Built-in widgets: Button, Label, Input, Checkbox, Slider, containers
//! - **[`style`]**: Properties, selectors, stylesheets and the cascade over the view tree
//! - **[`layout`]**: Taffy-powered layout of the surface
//! - **[`event`]**: Input model and the `Window` that routes pointer, focus and keys
//! - **[`script`]**: The Lua bridge: companions, signal forwarding, factories, style resolver
//! - **[`testing`]**: Headless `Pilot` and tree snapshots
//! - **[`geometry`]**: Offset, Size, Region primitives

// Foundation
pub mod error;
pub mod geometry;

// Native tree
pub mod animation;
pub mod style;
pub mod view;
pub mod widget;
pub mod widgets;

// Layout and input
pub mod event;
pub mod layout;

// Scripting
pub mod script;

// Testing support
pub mod testing;

pub use error::{EngineError, Error, Result};
pub use script::{EngineConfig, ScriptEngine};
pub use view::View;
