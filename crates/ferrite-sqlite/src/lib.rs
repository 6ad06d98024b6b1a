//! # ferrite-sqlite
//!
//! An sqlx-backed [`StatementExecutor`] for SQLite. Statements
//! compiled by `ferrite-orm` run here; sqlx caches prepared
//! statements by SQL text, so repeated statements reuse their
//! prepared form.

use std::collections::BTreeMap;

use ferrite_orm::{OrmError, Result, Row, StatementExecutor};
use ferrite_sql_core::{SqlStatement, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::debug;

/// A SQLite executor over an sqlx connection pool.
///
/// An open transaction is held on the executor and routes every
/// statement until commit or rollback; without one, statements run on
/// the pool directly.
pub struct SqliteExecutor {
    pool: SqlitePool,
    tx: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    /// Connects to a SQLite database URL (e.g. `sqlite::memory:`).
    ///
    /// # Errors
    ///
    /// Fails when the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|err| OrmError::Execution {
                sql: String::new(),
                params: Vec::new(),
                message: err.to_string(),
            })?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StatementExecutor for SqliteExecutor {
    async fn query(&self, stmt: &SqlStatement) -> Result<Vec<Row>> {
        debug!(sql = %stmt.sql, "executing query");
        let query = bind_all(sqlx::query(&stmt.sql), &stmt.params);
        let mut guard = self.tx.lock().await;
        let rows = match guard.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        }
        .map_err(|err| execution_error(stmt, &err))?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, stmt: &SqlStatement) -> Result<u64> {
        debug!(sql = %stmt.sql, "executing statement");
        let query = bind_all(sqlx::query(&stmt.sql), &stmt.params);
        let mut guard = self.tx.lock().await;
        let outcome = match guard.as_mut() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(|err| execution_error(stmt, &err))?;
        Ok(outcome.rows_affected())
    }

    async fn last_insert_id(&self) -> Result<i64> {
        let stmt = SqlStatement::new("SELECT last_insert_rowid()", Vec::new());
        let query = sqlx::query_scalar::<_, i64>(&stmt.sql);
        let mut guard = self.tx.lock().await;
        match guard.as_mut() {
            Some(tx) => query.fetch_one(&mut **tx).await,
            None => query.fetch_one(&self.pool).await,
        }
        .map_err(|err| execution_error(&stmt, &err))
    }

    async fn begin(&self) -> Result<()> {
        let mut guard = self.tx.lock().await;
        if guard.is_some() {
            return Err(OrmError::Execution {
                sql: String::from("BEGIN"),
                params: Vec::new(),
                message: String::from("transaction already open"),
            });
        }
        let tx = self.pool.begin().await.map_err(|err| OrmError::Execution {
            sql: String::from("BEGIN"),
            params: Vec::new(),
            message: err.to_string(),
        })?;
        *guard = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let tx = self.tx.lock().await.take().ok_or_else(|| OrmError::Execution {
            sql: String::from("COMMIT"),
            params: Vec::new(),
            message: String::from("no open transaction"),
        })?;
        tx.commit().await.map_err(|err| OrmError::Execution {
            sql: String::from("COMMIT"),
            params: Vec::new(),
            message: err.to_string(),
        })
    }

    async fn rollback(&self) -> Result<()> {
        let tx = self.tx.lock().await.take().ok_or_else(|| OrmError::Execution {
            sql: String::from("ROLLBACK"),
            params: Vec::new(),
            message: String::from("no open transaction"),
        })?;
        tx.rollback().await.map_err(|err| OrmError::Execution {
            sql: String::from("ROLLBACK"),
            params: Vec::new(),
            message: err.to_string(),
        })
    }
}

fn execution_error(stmt: &SqlStatement, err: &sqlx::Error) -> OrmError {
    OrmError::Execution {
        sql: stmt.sql.clone(),
        params: stmt.params.clone(),
        message: err.to_string(),
    }
}

/// Binds parameters in order.
fn bind_all<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    let mut query = query;
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Blob(b) => query.bind(b.as_slice()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
            SqlValue::Date(d) => query.bind(*d),
        };
    }
    query
}

/// Decodes a SQLite row into column-name → value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = BTreeMap::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i).map_err(|err| OrmError::Execution {
            sql: String::new(),
            params: Vec::new(),
            message: err.to_string(),
        })?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            decode_value(row, i, &type_name)?
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn decode_value(row: &SqliteRow, index: usize, type_name: &str) -> Result<SqlValue> {
    let decoded = match type_name {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(SqlValue::Int),
        "REAL" => row.try_get::<f64, _>(index).map(SqlValue::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Blob),
        _ => row.try_get::<String, _>(index).map(SqlValue::Text),
    };
    decoded.map_err(|err| OrmError::Execution {
        sql: String::new(),
        params: Vec::new(),
        message: err.to_string(),
    })
}
