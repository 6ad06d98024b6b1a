//! SQL dialect renderers.
//!
//! Rendering is identical across dialects except for the identifier
//! quote pair, limit semantics (`LIMIT n OFFSET m` vs `TOP n`), and the
//! rewrite of joined UPDATE/DELETE statements into `pk IN (SELECT …)`
//! subqueries. The trait carries default renderers; dialects override
//! only what differs.

mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{CompileError, Result};
use crate::spec::{DeleteSpec, InsertSpec, SelectSpec, SqlStatement, UpdateSpec};
use crate::value::SqlValue;

/// Trait for dialect-specific statement rendering.
pub trait Dialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote pair.
    fn quote_pair(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes an identifier with the dialect's quote pair.
    ///
    /// An embedded closing quote is escaped by doubling.
    fn quote_ident(&self, name: &str) -> String {
        let (open, close) = self.quote_pair();
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Whether the dialect can express a row offset.
    fn supports_offset(&self) -> bool {
        true
    }

    /// Returns the `TOP n` prefix for dialects that use one.
    fn top_clause(&self, _spec: &SelectSpec) -> Option<String> {
        None
    }

    /// Renders the trailing limit clause.
    ///
    /// # Errors
    ///
    /// Fails when an offset is requested on a dialect without offset
    /// support.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Result<String> {
        let Some(n) = limit else {
            return Ok(String::new());
        };
        let mut clause = format!(" LIMIT {n}");
        if let Some(m) = offset {
            clause.push_str(&format!(" OFFSET {m}"));
        }
        Ok(clause)
    }

    /// Renders a SELECT statement.
    ///
    /// # Errors
    ///
    /// Fails when the specification uses a construct the dialect cannot
    /// express.
    fn compile_select(&self, spec: &SelectSpec) -> Result<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT ");

        if spec.distinct {
            sql.push_str("DISTINCT ");
        }
        if let Some(top) = self.top_clause(spec) {
            sql.push_str(&top);
        }
        sql.push_str(&spec.render_items());
        sql.push_str(" FROM ");
        sql.push_str(&spec.render_from());

        if let Some(where_body) = spec.render_where(true, &mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&where_body);
        }
        if let Some(group_body) = spec.render_group() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_body);
        }
        if let Some(order_body) = spec.render_order() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_body);
        }
        sql.push_str(&self.limit_clause(spec.limit, spec.offset)?);

        Ok(SqlStatement::new(sql, params))
    }

    /// Renders an INSERT statement.
    ///
    /// # Errors
    ///
    /// Fails when the specification has no columns.
    fn compile_insert(&self, spec: &InsertSpec) -> Result<SqlStatement> {
        if spec.columns.is_empty() {
            return Err(CompileError::InvalidSpec("insert requires at least one column"));
        }
        let placeholders: Vec<&str> = spec.values.iter().map(|_| "?").collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            spec.table,
            spec.columns.join(", "),
            placeholders.join(", ")
        );
        Ok(SqlStatement::new(sql, spec.values.clone()))
    }

    /// Renders an UPDATE statement.
    ///
    /// When the row restriction required joins, the predicate is
    /// rewritten as `pk IN (SELECT …)` since UPDATE cannot reference
    /// joined aliases in the target dialect.
    ///
    /// # Errors
    ///
    /// Fails when the specification has no assignments.
    fn compile_update(&self, spec: &UpdateSpec) -> Result<SqlStatement> {
        if spec.assignments.is_empty() {
            return Err(CompileError::InvalidSpec("update requires at least one assignment"));
        }
        let mut params: Vec<SqlValue> =
            spec.assignments.iter().map(|(_, v)| v.clone()).collect();
        let assignments: Vec<String> = spec
            .assignments
            .iter()
            .map(|(col, _)| format!("{col} = ?"))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", spec.table, assignments.join(", "));
        sql.push_str(&render_restriction(
            &spec.rows,
            &spec.pk_column,
            &mut params,
        ));
        Ok(SqlStatement::new(sql, params))
    }

    /// Renders a DELETE statement, with the same joined-predicate
    /// rewrite as [`compile_update`](Self::compile_update).
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for parity with the other
    /// compile entry points.
    fn compile_delete(&self, spec: &DeleteSpec) -> Result<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", spec.table);
        sql.push_str(&render_restriction(
            &spec.rows,
            &spec.pk_column,
            &mut params,
        ));
        Ok(SqlStatement::new(sql, params))
    }
}

/// Renders the WHERE clause of an UPDATE/DELETE target.
///
/// Without joins the predicates apply directly (bare column names);
/// with joins the row set becomes a `pk IN (SELECT …)` subquery.
fn render_restriction(
    rows: &SelectSpec,
    pk_column: &str,
    params: &mut Vec<SqlValue>,
) -> String {
    if rows.joins.is_empty() {
        match rows.render_where(false, params) {
            Some(body) => format!(" WHERE {body}"),
            None => String::new(),
        }
    } else {
        let mut sub = format!(
            "SELECT {}.{} FROM {}",
            rows.from.alias,
            pk_column,
            rows.render_from()
        );
        if let Some(body) = rows.render_where(true, params) {
            sub.push_str(" WHERE ");
            sub.push_str(&body);
        }
        format!(" WHERE {pk_column} IN ({sub})")
    }
}
