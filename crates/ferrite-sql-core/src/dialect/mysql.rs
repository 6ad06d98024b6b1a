//! MySQL dialect.

use super::Dialect;

/// MySQL statement renderer.
///
/// Identifiers are backtick-quoted; limit handling is native.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_pair(&self) -> (char, char) {
        ('`', '`')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(MysqlDialect::new().quote_ident("order"), "`order`");
    }
}
