//! Microsoft SQL Server dialect.

use super::Dialect;
use crate::error::{CompileError, Result};
use crate::spec::SelectSpec;

/// SQL Server statement renderer.
///
/// Row limits render as `SELECT TOP n …`; there is no offset support,
/// so requesting one fails before any SQL reaches an executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_pair(&self) -> (char, char) {
        ('[', ']')
    }

    fn supports_offset(&self) -> bool {
        false
    }

    fn top_clause(&self, spec: &SelectSpec) -> Option<String> {
        spec.limit.map(|n| format!("TOP {n} "))
    }

    fn limit_clause(&self, _limit: Option<u64>, offset: Option<u64>) -> Result<String> {
        if offset.is_some() {
            return Err(CompileError::Unsupported {
                dialect: "mssql",
                feature: "OFFSET",
            });
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_replaces_limit() {
        let mut spec = SelectSpec::new("t", "t1");
        spec.limit = Some(3);
        let stmt = MssqlDialect::new().compile_select(&spec).unwrap();
        assert_eq!(stmt.sql, "SELECT TOP 3 t1.* FROM t AS t1");
    }

    #[test]
    fn test_offset_is_unsupported() {
        let mut spec = SelectSpec::new("t", "t1");
        spec.limit = Some(3);
        spec.offset = Some(6);
        let err = MssqlDialect::new().compile_select(&spec).unwrap_err();
        assert_eq!(
            err,
            CompileError::Unsupported {
                dialect: "mssql",
                feature: "OFFSET"
            }
        );
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(MssqlDialect::new().quote_ident("order"), "[order]");
    }
}
