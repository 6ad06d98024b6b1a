//! SQLite dialect.

use super::Dialect;

/// SQLite statement renderer.
///
/// SQLite follows the defaults: double-quoted identifiers and native
/// `LIMIT n OFFSET m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}
