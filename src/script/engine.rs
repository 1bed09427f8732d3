//! ScriptEngine: one Lua state wired to one window.
//!
//! [`ScriptEngine`] owns the Lua state, the [`Window`] scripts draw into and
//! the [`FutureQueue`] that marshals completions back onto this thread.

use std::path::{Path, PathBuf};

use mlua::prelude::*;

use super::future::{FutureCompleter, FutureQueue, ScriptFuture};
use super::{animator, enums, expose, future, globals, rules};
use crate::error::EngineError;
use crate::event::window::Window;
use crate::geometry::Size;
use crate::view::{SignalKind, View};

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`ScriptEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial window size in logical pixels.
    pub surface_size: Size,
    /// Directory relative script paths and `require` resolve against.
    pub script_root: PathBuf,
    /// Upper bound on Lua heap usage, in bytes.
    pub memory_limit: Option<usize>,
    /// Initial DPI ratio.
    pub dpi_ratio: f32,
    /// Whether to install `IS_64BIT`, `PLATFORM_LINUX` and friends.
    pub platform_flags: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_size: Size::new(80, 24),
            script_root: PathBuf::from("."),
            memory_limit: None,
            dpi_ratio: 1.0,
            platform_flags: true,
        }
    }
}

impl EngineConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the surface size (builder).
    pub fn with_surface_size(mut self, size: Size) -> Self {
        self.surface_size = size;
        self
    }

    /// Set the script root (builder).
    pub fn with_script_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.script_root = root.into();
        self
    }

    /// Set the Lua memory limit (builder).
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Set the DPI ratio (builder).
    pub fn with_dpi_ratio(mut self, ratio: f32) -> Self {
        self.dpi_ratio = ratio;
        self
    }

    /// Enable or disable platform flag globals (builder).
    pub fn with_platform_flags(mut self, enabled: bool) -> Self {
        self.platform_flags = enabled;
        self
    }
}

// ---------------------------------------------------------------------------
// ScriptEngine
// ---------------------------------------------------------------------------

pub struct ScriptEngine {
    lua: Lua,
    window: Window,
    futures: FutureQueue,
    config: EngineConfig,
}

impl ScriptEngine {
    /// Create a Lua state with every binding installed.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let lua = Lua::new();
        if let Some(limit) = config.memory_limit {
            lua.set_memory_limit(limit)?;
        }

        let window = Window::new(config.surface_size);
        window.set_dpi_ratio(config.dpi_ratio);
        let futures = FutureQueue::new();
        lua.set_app_data(window.clone());
        lua.set_app_data(futures.clone());

        globals::register(&lua)?;
        if config.platform_flags {
            globals::install_platform_flags(&lua)?;
        }
        enums::register_all(&lua)?;
        rules::register(&lua)?;
        animator::register(&lua)?;
        expose::register(&lua)?;
        future::register(&lua)?;
        extend_package_path(&lua, &config.script_root)?;

        tracing::debug!(size = %config.surface_size, root = %config.script_root.display(), "script engine ready");
        Ok(Self { lua, window, futures, config })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The view scripts installed with `UI.setSurface`.
    pub fn surface(&self) -> Option<View> {
        self.window.surface()
    }

    /// Run a chunk. `name` shows up in error messages and tracebacks.
    pub fn exec(&self, source: &str, name: &str) -> Result<(), EngineError> {
        self.lua.load(source).set_name(name).exec()?;
        Ok(())
    }

    /// Evaluate an expression or chunk and convert its result.
    pub fn eval<T: FromLuaMulti>(&self, source: &str) -> Result<T, EngineError> {
        Ok(self.lua.load(source).eval()?)
    }

    /// Run a script file. Relative paths resolve against the script root.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = self.resolve(path.as_ref());
        let source = std::fs::read_to_string(&path)?;
        tracing::info!(path = %path.display(), bytes = source.len(), "loading script");
        self.exec(&source, &format!("@{}", path.display()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.config.script_root.join(path) }
    }

    /// Lay the surface out over the window.
    pub fn update_layout(&self) -> Result<(), EngineError> {
        Ok(self.window.update_layout()?)
    }

    /// Deliver completed futures. Returns how many settled.
    pub fn pump(&self) -> Result<usize, EngineError> {
        Ok(self.futures.pump()?)
    }

    /// Wait for every outstanding future, delivering each as it completes.
    pub async fn wait_pending(&self) -> Result<(), EngineError> {
        Ok(self.futures.wait_pending().await?)
    }

    /// A pending future for scripts and the `Send` completer that settles it.
    pub fn create_future(&self) -> (ScriptFuture, FutureCompleter) {
        self.futures.create()
    }

    pub fn pending_futures(&self) -> usize {
        self.futures.pending()
    }
}

impl Drop for ScriptEngine {
    fn drop(&mut self) {
        // The surface anchors its script handle; closing the state reclaims
        // everything else.
        drop(self.window.steal_surface());
        self.window.anchor().disconnect_all(SignalKind::WindowKeyDown);
    }
}

fn extend_package_path(lua: &Lua, root: &Path) -> LuaResult<()> {
    let package: LuaTable = lua.globals().get("package")?;
    let current: String = package.get("path")?;
    let root = root.display();
    package.set("path", format!("{root}/?.lua;{root}/?/init.lua;{current}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders() {
        let config = EngineConfig::new()
            .with_surface_size(Size::new(120, 40))
            .with_script_root("/tmp/scripts")
            .with_memory_limit(1 << 20)
            .with_dpi_ratio(2.0)
            .with_platform_flags(false);
        assert_eq!(config.surface_size, Size::new(120, 40));
        assert_eq!(config.script_root, PathBuf::from("/tmp/scripts"));
        assert_eq!(config.memory_limit, Some(1 << 20));
        assert_eq!(config.dpi_ratio, 2.0);
        assert!(!config.platform_flags);
    }

    #[test]
    fn engine_installs_surface_api() {
        let engine = ScriptEngine::new(EngineConfig::default()).unwrap();
        engine.exec("UI.setSurface(Vertical(Button('ok')))", "=test").unwrap();
        let surface = engine.surface().unwrap();
        assert_eq!(surface.child_count(), Some(1));
        let ratio: f32 = engine.eval("return Window.getDpiRatio()").unwrap();
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn platform_flags_are_optional() {
        let engine = ScriptEngine::new(EngineConfig::new().with_platform_flags(false)).unwrap();
        let missing: bool = engine.eval("return IS_64BIT == nil").unwrap();
        assert!(missing);
    }

    #[test]
    fn script_errors_surface_as_lua_errors() {
        let engine = ScriptEngine::new(EngineConfig::default()).unwrap();
        let err = engine.exec("Button(1, 2)", "=bad").unwrap_err();
        assert!(matches!(err, EngineError::Lua(_)));
        assert!(err.to_string().contains("arguments to Button"), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let engine = ScriptEngine::new(EngineConfig::new().with_script_root("/nonexistent")).unwrap();
        assert!(matches!(engine.run_file("nope.lua"), Err(EngineError::Io(_))));
    }

    #[test]
    fn host_future_reaches_script() {
        let engine = ScriptEngine::new(EngineConfig::default()).unwrap();
        let (future, completer) = engine.create_future();
        engine.lua().globals().set("f", future).unwrap();
        engine.exec("got = nil; f:when(function(ok, v) got = v end)", "=future").unwrap();
        std::thread::spawn(move || completer.resolve("done")).join().unwrap();
        assert_eq!(engine.pump().unwrap(), 1);
        let got: String = engine.eval("return got").unwrap();
        assert_eq!(got, "done");
    }
}
