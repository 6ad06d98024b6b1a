//! Error types for statement compilation.

use thiserror::Error;

/// Errors raised while rendering a query specification to SQL.
///
/// Compilation errors are raised before any SQL text reaches an
/// executor, so a failed compile never leaves a half-executed
/// statement behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// The target dialect cannot express the requested construct.
    #[error("dialect {dialect} does not support {feature}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// The construct that cannot be rendered.
        feature: &'static str,
    },

    /// The specification is structurally incomplete.
    #[error("invalid statement: {0}")]
    InvalidSpec(&'static str),
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
