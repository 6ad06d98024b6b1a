//! The statement executor boundary.
//!
//! The compiler never talks to a database itself: it hands compiled
//! statements to an executor supplied by the caller. `ferrite-sqlite`
//! provides an sqlx-backed implementation.

use std::collections::BTreeMap;

use ferrite_sql_core::{SqlStatement, SqlValue};
use tracing::warn;

use crate::error::Result;

/// A result row: column name to value.
pub type Row = BTreeMap<String, SqlValue>;

/// An executor capable of running compiled statements.
///
/// Statement preparation is the executor's concern (drivers cache
/// prepared statements by SQL text); transaction semantics are
/// delegated here too, since the compiler only orders statements.
#[allow(async_fn_in_trait)]
pub trait StatementExecutor {
    /// Runs a statement that returns rows.
    async fn query(&self, stmt: &SqlStatement) -> Result<Vec<Row>>;

    /// Runs a statement and returns the affected row count.
    async fn execute(&self, stmt: &SqlStatement) -> Result<u64>;

    /// Returns the row id of the last INSERT.
    async fn last_insert_id(&self) -> Result<i64>;

    /// Opens a transaction.
    async fn begin(&self) -> Result<()>;

    /// Commits the open transaction.
    async fn commit(&self) -> Result<()>;

    /// Rolls back the open transaction.
    async fn rollback(&self) -> Result<()>;
}

/// Runs an ordered statement batch inside one transaction,
/// all-or-nothing.
///
/// Cascade plans must run through this (or an equivalent): a failure
/// mid-sequence rolls back every statement already applied.
///
/// # Errors
///
/// Returns the first statement failure after rolling back.
pub async fn execute_batch<E: StatementExecutor>(
    executor: &E,
    statements: &[SqlStatement],
) -> Result<u64> {
    executor.begin().await?;
    let mut affected = 0;
    for stmt in statements {
        match executor.execute(stmt).await {
            Ok(count) => affected += count,
            Err(err) => {
                if let Err(rollback_err) = executor.rollback().await {
                    warn!(error = %rollback_err, "rollback after failed batch statement failed");
                }
                return Err(err);
            }
        }
    }
    executor.commit().await?;
    Ok(affected)
}
