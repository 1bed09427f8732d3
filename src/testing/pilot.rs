//! Pilot: programmatic interaction with a headless script engine.
//!
//! The `Pilot` wraps a [`ScriptEngine`] and provides methods to run script
//! snippets, simulate user input (clicks, hover, keys, typing) and render the
//! surface to text for snapshot testing.

use crate::error::EngineError;
use crate::event::input::{Key, PointerButton};
use crate::event::window::Window;
use crate::geometry::{Offset, Region, Size};
use crate::script::{EngineConfig, ScriptEngine};
use crate::view::View;

use super::snapshot::render_surface;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless engine driver for testing.
///
/// # Examples
///
/// ```ignore
/// use gilt_script::testing::Pilot;
///
/// let pilot = Pilot::new(80, 24).unwrap();
/// pilot.exec("UI.setSurface(Vertical(Button('OK')))").unwrap();
/// let button = pilot.find("Button").unwrap();
/// pilot.click(&button).unwrap();
/// ```
pub struct Pilot {
    engine: ScriptEngine,
}

impl Pilot {
    /// Create an engine with a window of the given size.
    pub fn new(width: i32, height: i32) -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::new().with_surface_size(Size::new(width, height)))
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self { engine: ScriptEngine::new(config)? })
    }

    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    pub fn window(&self) -> &Window {
        self.engine.window()
    }

    // ── Scripts ──────────────────────────────────────────────────────

    /// Run a snippet, then deliver any completed futures.
    pub fn exec(&self, source: &str) -> Result<(), EngineError> {
        self.engine.exec(source, "=pilot")?;
        self.engine.pump()?;
        Ok(())
    }

    pub fn eval<T: mlua::FromLuaMulti>(&self, source: &str) -> Result<T, EngineError> {
        self.engine.eval(source)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The first view in the surface tree (pre-order) carrying style name
    /// `name`.
    pub fn find(&self, name: &str) -> Option<View> {
        self.find_all(name).into_iter().next()
    }

    pub fn find_all(&self, name: &str) -> Vec<View> {
        self.engine
            .surface()
            .map(|s| s.descendants().into_iter().filter(|v| v.has_style_name(name)).collect())
            .unwrap_or_default()
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Lay out, then press and release the left button over `view`.
    pub fn click(&self, view: &View) -> Result<(), EngineError> {
        self.layout()?;
        Ok(self.window().click(view, PointerButton::Left)?)
    }

    pub fn right_click(&self, view: &View) -> Result<(), EngineError> {
        self.layout()?;
        Ok(self.window().click(view, PointerButton::Right)?)
    }

    /// Lay out, then move the pointer to the center of `view`.
    pub fn hover(&self, view: &View) -> Result<(), EngineError> {
        self.layout()?;
        Ok(self.window().pointer_move(center(view))?)
    }

    /// Move the pointer out of the window.
    pub fn unhover(&self) -> Result<(), EngineError> {
        Ok(self.window().pointer_leave()?)
    }

    pub fn scroll(&self, view: &View, delta: Offset) -> Result<(), EngineError> {
        self.layout()?;
        Ok(self.window().scroll(center(view), delta, false)?)
    }

    /// Key down then key up.
    pub fn press_key(&self, key: Key) -> Result<(), EngineError> {
        self.window().key_down(key)?;
        self.window().key_up(key)?;
        Ok(())
    }

    /// Type `text` into the focused view.
    pub fn type_text(&self, text: &str) -> Result<(), EngineError> {
        Ok(self.window().type_text(text)?)
    }

    pub fn resize(&self, width: i32, height: i32) -> Result<(), EngineError> {
        self.window().resize(Size::new(width, height));
        self.layout()
    }

    // ── Processing ───────────────────────────────────────────────────

    pub fn layout(&self) -> Result<(), EngineError> {
        self.engine.update_layout()
    }

    pub fn pump(&self) -> Result<usize, EngineError> {
        self.engine.pump()
    }

    /// The surface tree as text. See [`super::snapshot::render_tree`].
    pub fn snapshot(&self) -> String {
        render_surface(self.window())
    }
}

fn center(view: &View) -> Offset {
    Region::new(view.global_position(), view.size()).center()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
