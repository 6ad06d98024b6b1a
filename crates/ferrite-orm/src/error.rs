//! Error types for the ORM.

use ferrite_sql_core::{CompileError, SqlValue};
use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Bad or ambiguous entity declaration. Fatal at normalization
    /// time, never recoverable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A path segment did not resolve to a field or relation. Fatal to
    /// the current call; the builder lineage stays valid.
    #[error("cannot resolve '{segment}' on entity '{entity}'")]
    Resolution {
        /// Entity the segment was looked up on.
        entity: String,
        /// The offending path segment.
        segment: String,
    },

    /// Invalid filter shape (unknown operator, non-list IN value, …).
    #[error("invalid filter: {0}")]
    Filter(String),

    /// The dialect cannot express the requested construct.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A driver failure, with the failing statement attached.
    #[error("execution failed: {message} (sql: {sql})")]
    Execution {
        /// The SQL text that failed.
        sql: String,
        /// The parameters bound to the statement.
        params: Vec<SqlValue>,
        /// Driver error text.
        message: String,
    },
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
