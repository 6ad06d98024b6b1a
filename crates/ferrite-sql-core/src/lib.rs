//! # ferrite-sql-core
//!
//! The passive half of the ferrite query compiler: a typed query
//! specification (select/join/predicate nodes), SQL parameter values,
//! and dialect renderers that turn a specification into literal SQL
//! text plus an ordered parameter list.
//!
//! The specification types carry no behavior beyond rendering: the
//! builder in `ferrite-orm` produces them, and alternate dialects can
//! be added here without touching the builder.

pub mod dialect;
pub mod error;
pub mod spec;
pub mod value;

pub use dialect::{Dialect, MssqlDialect, MysqlDialect, PostgresDialect, SqliteDialect};
pub use error::{CompileError, Result};
pub use spec::{
    ColumnRef, CompareOp, DeleteSpec, InsertSpec, JoinClause, JoinKind, OrderDirection, OrderTerm,
    Predicate, SelectItem, SelectSpec, SqlStatement, TableRef, UpdateSpec,
};
pub use value::{SqlValue, ToSqlValue};
