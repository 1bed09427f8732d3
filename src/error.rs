//! Error taxonomy shared by the native tree and the script bridge.
//!
//! [`Error`] is what native operations return. Every variant is recoverable:
//! at the script boundary it is turned into a catchable Lua error by the single
//! `From<Error> for mlua::Error` conversion below. [`EngineError`] is the
//! host-facing error of [`crate::script::ScriptEngine`].

/// Result alias for native operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A script value could not be interpreted as the requested native type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {actual} to {expected}: {message}")]
pub struct ConversionError {
    /// Native type that was requested, e.g. `vec2` or `color`.
    pub expected: String,
    /// Script type name of the offending value.
    pub actual: String,
    pub message: String,
}

impl ConversionError {
    pub fn new(
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { expected: expected.into(), actual: actual.into(), message: message.into() }
    }
}

/// A declaration table entry the style resolver could not classify.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("setStyle: unexpected value at {path}{}: {value}", hint_suffix(.hint))]
pub struct StyleError {
    /// Selector path and key, e.g. `Button hover`.
    pub path: String,
    /// Debug rendering of the offending value.
    pub value: String,
    pub hint: Option<String>,
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref().map(|h| format!(" ({h})")).unwrap_or_default()
}

/// Errors raised by native operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An operation was invoked on an incompatible widget or with arguments of
    /// the wrong type or arity.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A structurally invalid request: out of range index, missing argument,
    /// container operation on a leaf.
    #[error("{operation}: {message}")]
    InvalidOperation { operation: String, message: String },

    #[error(transparent)]
    Style(#[from] StyleError),

    /// A script callback failed while a native signal was being emitted.
    #[error("{signal} callback failed: {message}")]
    Callback { signal: String, message: String },

    /// The Lua state refused a bookkeeping operation on script data.
    #[error("script data: {0}")]
    Script(String),
}

impl Error {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch { expected: expected.into(), actual: actual.into() }
    }

    pub fn invalid(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidOperation { operation: operation.into(), message: message.into() }
    }
}

impl From<Error> for mlua::Error {
    fn from(err: Error) -> Self {
        mlua::Error::external(err)
    }
}

impl From<ConversionError> for mlua::Error {
    fn from(err: ConversionError) -> Self {
        mlua::Error::external(Error::Conversion(err))
    }
}

impl From<StyleError> for mlua::Error {
    fn from(err: StyleError) -> Self {
        mlua::Error::external(Error::Style(err))
    }
}

impl From<mlua::Error> for Error {
    fn from(err: mlua::Error) -> Self {
        Error::Script(err.to_string())
    }
}

/// Errors surfaced to the embedding host.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bridge(#[from] Error),

    #[error("no tokio runtime available for {0}")]
    NoRuntime(&'static str),
}
