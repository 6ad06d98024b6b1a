//! PostgreSQL dialect.

use super::Dialect;

/// PostgreSQL statement renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SelectSpec;

    #[test]
    fn test_limit() {
        let mut spec = SelectSpec::new("t", "t1");
        spec.limit = Some(10);
        let stmt = PostgresDialect::new().compile_select(&spec).unwrap();
        assert_eq!(stmt.sql, "SELECT t1.* FROM t AS t1 LIMIT 10");
    }
}
