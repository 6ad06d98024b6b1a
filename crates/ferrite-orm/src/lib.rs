//! # ferrite-orm
//!
//! A relation-path resolver and query compiler: declared entity
//! schemas (fields, foreign keys, one-to-one links, many-to-many
//! relations) map onto relational tables, and chained dotted paths
//! like `author__profile_set__age` compile into alias-disambiguated
//! SQL across arbitrarily deep joins.
//!
//! This crate provides:
//! - [`EntityDecl`]/[`FieldDef`] for declaring entities
//! - [`Registry`], the caller-owned metadata cache that normalizes
//!   declarations (synthesizing `pk` fields, reverse accessors, and
//!   many-to-many junction entities)
//! - [`Query`], an immutable chainable builder whose terminals
//!   compile to `(sql, params)` statements, including ordered
//!   cascade-delete batches
//! - [`StatementExecutor`], the boundary to the database driver
//!
//! ## Quick start
//!
//! ```ignore
//! use ferrite_orm::{EntityDecl, FieldDef, Registry};
//!
//! let registry = Registry::new();
//! registry.declare(EntityDecl::new("user").field("name", FieldDef::string()))?;
//! registry.declare(
//!     EntityDecl::new("blog")
//!         .field("title", FieldDef::string())
//!         .field("author", FieldDef::foreign_key("user")),
//! )?;
//!
//! let stmt = registry
//!     .query("blog")?
//!     .filter("author__name", "=", "Andy")?
//!     .select()?;
//! // SELECT t1.* FROM blog AS t1
//! //   INNER JOIN user AS t2 ON t1.author_id = t2.user_id
//! //   WHERE t2.name = ?
//! ```

mod error;
pub mod executor;
pub mod meta;
pub mod query;
mod record;
pub mod schema;

pub use error::{OrmError, Result};
pub use executor::{execute_batch, Row, StatementExecutor};
pub use meta::{
    EntityDecl, EntityMeta, FieldDef, FieldKind, FieldSpec, FieldType, ForeignKeyDef,
    ManyToManyDef, ManyToManySpec, OnDelete, Registry, RelationSpec, ReverseKind, ReverseSpec,
};
pub use query::Query;
pub use record::{Arg, Record};
pub use schema::{ColumnSpec, TableSpec};

// Re-export the value, statement and dialect types callers handle
// directly.
pub use ferrite_sql_core::{
    Dialect, MssqlDialect, MysqlDialect, PostgresDialect, SqlStatement, SqlValue, SqliteDialect,
    ToSqlValue,
};
