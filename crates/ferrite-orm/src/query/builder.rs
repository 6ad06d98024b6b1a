//! The immutable query builder.
//!
//! A `Query` is a value: every mutating method clones, applies the
//! change to the clone, and returns it. Fallible methods leave the
//! receiver untouched on error, so a failed `filter` never corrupts
//! the lineage it was called on. Two builders derived from the same
//! ancestor never observe each other's joins or aliases.

use std::fmt;
use std::sync::Arc;

use ferrite_sql_core::{
    ColumnRef, CompareOp, Dialect, InsertSpec, OrderDirection, OrderTerm, Predicate, SelectItem,
    SelectSpec, SqlStatement, SqlValue, UpdateSpec,
};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::meta::{EntityMeta, Registry};
use crate::query::cascade;
use crate::query::planner::{JoinPlanner, BASE_ALIAS};
use crate::query::resolver::{resolve_path, ResolveOptions};
use crate::record::{Arg, Record};

enum Op {
    Compare(CompareOp),
    In,
}

fn parse_op(op: &str) -> Result<Op> {
    Ok(match op {
        "=" => Op::Compare(CompareOp::Eq),
        "<" => Op::Compare(CompareOp::Lt),
        ">" => Op::Compare(CompareOp::Gt),
        "<=" => Op::Compare(CompareOp::Lte),
        ">=" => Op::Compare(CompareOp::Gte),
        "LIKE" | "like" => Op::Compare(CompareOp::Like),
        "IN" | "in" => Op::In,
        other => return Err(OrmError::Filter(format!("unknown operator '{other}'"))),
    })
}

/// A chainable, immutable query against one entity.
///
/// # Example
///
/// ```ignore
/// let blogs = registry
///     .query("blog")?
///     .filter("author__name", "=", "Andy")?
///     .order_by("-pk")?
///     .limit(10, None)
///     .select()?;
/// ```
#[derive(Clone)]
pub struct Query {
    registry: Registry,
    meta: Arc<EntityMeta>,
    dialect: Arc<dyn Dialect + Send + Sync>,
    planner: JoinPlanner,
    items: Vec<SelectItem>,
    predicates: Vec<Predicate>,
    order_by: Vec<OrderTerm>,
    group_by: Vec<ColumnRef>,
    limit: Option<(u64, Option<u64>)>,
    distinct: bool,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entity", &self.meta.name)
            .field("joins", &self.planner.joins().len())
            .field("predicates", &self.predicates.len())
            .finish_non_exhaustive()
    }
}

impl Query {
    pub(crate) fn new(
        registry: Registry,
        meta: Arc<EntityMeta>,
        dialect: Arc<dyn Dialect + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            meta,
            dialect,
            planner: JoinPlanner::new(),
            items: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: None,
            distinct: false,
        }
    }

    /// The entity this query targets.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.meta.name
    }

    /// Adds a comparison filter on a dotted path.
    ///
    /// Supported operators: `=`, `<`, `>`, `<=`, `>=`, `LIKE`, `IN`.
    /// `IN` requires a list value and expands to one placeholder per
    /// element. A `Record` value is coerced to its primary key.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path or an invalid operator/value
    /// combination; the receiver is left untouched.
    pub fn filter<A: Into<Arg>>(&self, path: &str, op: &str, value: A) -> Result<Self> {
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::filter(),
        )?;
        let column = ColumnRef::new(&resolved.alias, &resolved.column);
        let predicate = match (parse_op(op)?, value.into()) {
            (Op::In, Arg::List(values)) => Predicate::InList { column, values },
            (Op::In, _) => {
                return Err(OrmError::Filter(String::from("IN requires a list value")))
            }
            (Op::Compare(op), Arg::Value(value)) => Predicate::Compare { column, op, value },
            (Op::Compare(op), Arg::Record(record)) => Predicate::Compare {
                column,
                op,
                value: next.coerce_record(&record)?,
            },
            (Op::Compare(_), Arg::List(_)) => {
                return Err(OrmError::Filter(String::from(
                    "list value is only valid with the IN operator",
                )))
            }
        };
        next.predicates.push(predicate);
        Ok(next)
    }

    /// Adds a filter with a raw SQL suffix after the resolved column,
    /// e.g. `filter_special("author__name", "IS NOT NULL")`.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path.
    pub fn filter_special(&self, path: &str, suffix: &str) -> Result<Self> {
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::filter(),
        )?;
        next.predicates.push(Predicate::Suffix {
            column: ColumnRef::new(&resolved.alias, &resolved.column),
            suffix: suffix.to_string(),
        });
        Ok(next)
    }

    /// Adds a raw templated WHERE clause with its own parameters.
    #[must_use]
    pub fn where_raw(&self, clause: &str, params: Vec<SqlValue>) -> Self {
        let mut next = self.clone();
        next.predicates.push(Predicate::Raw {
            sql: clause.to_string(),
            params,
        });
        next
    }

    /// Eagerly joins a relation path and selects its columns.
    ///
    /// Eager joins are LEFT (retrieving related data must not narrow
    /// the base result set) and always join through to the far
    /// entity.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path.
    pub fn with(&self, path: &str) -> Result<Self> {
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::eager(),
        )?;
        if next.items.is_empty() {
            next.items.push(SelectItem::Star(String::from(BASE_ALIAS)));
        }
        let star = SelectItem::Star(resolved.alias);
        if !next.items.contains(&star) {
            next.items.push(star);
        }
        Ok(next)
    }

    /// Adds an ORDER BY term; prefix the path with `-` for
    /// descending.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path.
    pub fn order_by(&self, spec: &str) -> Result<Self> {
        let (path, direction) = match spec.strip_prefix('-') {
            Some(path) => (path, OrderDirection::Desc),
            None => (spec, OrderDirection::Asc),
        };
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::filter(),
        )?;
        next.order_by.push(OrderTerm {
            column: ColumnRef::new(&resolved.alias, &resolved.column),
            direction,
        });
        Ok(next)
    }

    /// Adds a GROUP BY column.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path.
    pub fn group_by(&self, path: &str) -> Result<Self> {
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::filter(),
        )?;
        next.group_by
            .push(ColumnRef::new(&resolved.alias, &resolved.column));
        Ok(next)
    }

    /// Sets the row limit and optional offset.
    ///
    /// The first call wins: later calls on the same lineage are
    /// no-ops, so a downstream default cannot override an explicit
    /// limit set upstream.
    #[must_use]
    pub fn limit(&self, n: u64, offset: Option<u64>) -> Self {
        if self.limit.is_some() {
            return self.clone();
        }
        let mut next = self.clone();
        next.limit = Some((n, offset));
        next
    }

    /// Makes the query return distinct rows.
    #[must_use]
    pub fn distinct(&self) -> Self {
        let mut next = self.clone();
        next.distinct = true;
        next
    }

    /// Adds an extra projected column without affecting hydration.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable path.
    pub fn field(&self, path: &str, as_name: Option<&str>) -> Result<Self> {
        let mut next = self.clone();
        let resolved = resolve_path(
            &next.registry,
            &next.meta,
            &mut next.planner,
            path,
            ResolveOptions::filter(),
        )?;
        if next.items.is_empty() {
            next.items.push(SelectItem::Star(String::from(BASE_ALIAS)));
        }
        next.items.push(SelectItem::Column {
            column: ColumnRef::new(&resolved.alias, &resolved.column),
            as_name: as_name.map(String::from),
        });
        Ok(next)
    }

    /// Compiles the accumulated state into a SELECT statement.
    ///
    /// # Errors
    ///
    /// Fails when the dialect cannot express the specification.
    pub fn select(&self) -> Result<SqlStatement> {
        let stmt = self.dialect.compile_select(&self.select_spec())?;
        debug!(sql = %stmt.sql, "compiled select");
        Ok(stmt)
    }

    /// Compiles an INSERT of the given field values.
    ///
    /// # Errors
    ///
    /// Fails on unknown fields, many-to-many fields (which have no
    /// column), or list values.
    pub fn insert(&self, values: Vec<(&str, Arg)>) -> Result<SqlStatement> {
        let mut columns = Vec::with_capacity(values.len());
        let mut bound = Vec::with_capacity(values.len());
        for (name, arg) in values {
            columns.push(self.writable_column(name)?);
            bound.push(self.arg_value(arg)?);
        }
        let stmt = self.dialect.compile_insert(&InsertSpec {
            table: self.meta.table.clone(),
            columns,
            values: bound,
        })?;
        debug!(sql = %stmt.sql, "compiled insert");
        Ok(stmt)
    }

    /// Compiles an UPDATE of the given field values over the filtered
    /// row set.
    ///
    /// When the filters required joins, the dialect rewrites the
    /// predicate as a `pk IN (SELECT …)` subquery.
    ///
    /// # Errors
    ///
    /// Fails on unknown fields, many-to-many fields, or list values.
    pub fn update(&self, values: Vec<(&str, Arg)>) -> Result<SqlStatement> {
        let mut assignments = Vec::with_capacity(values.len());
        for (name, arg) in values {
            assignments.push((self.writable_column(name)?, self.arg_value(arg)?));
        }
        let stmt = self.dialect.compile_update(&UpdateSpec {
            table: self.meta.table.clone(),
            pk_column: self.meta.pk().db_column.clone(),
            assignments,
            rows: self.restriction(),
        })?;
        debug!(sql = %stmt.sql, "compiled update");
        Ok(stmt)
    }

    /// Plans the deletion of the filtered row set.
    ///
    /// Returns the ordered statement batch: junction rows and
    /// dependents first (per their on-delete policies), the filtered
    /// DELETE of this entity last. Run the batch inside one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fails when a dependent entity's declaration is broken.
    pub fn delete(&self) -> Result<Vec<SqlStatement>> {
        cascade::plan_delete(
            &self.registry,
            self.dialect.as_ref(),
            &self.meta,
            &self.restriction(),
        )
    }

    fn select_spec(&self) -> SelectSpec {
        let mut spec = SelectSpec::new(&self.meta.table, BASE_ALIAS);
        spec.distinct = self.distinct;
        spec.items = self.items.clone();
        spec.joins = self.planner.joins().to_vec();
        spec.predicates = self.predicates.clone();
        spec.group_by = self.group_by.clone();
        spec.order_by = self.order_by.clone();
        if let Some((limit, offset)) = self.limit {
            spec.limit = Some(limit);
            spec.offset = offset;
        }
        spec
    }

    /// The filtered row set, used as the target of UPDATE/DELETE.
    fn restriction(&self) -> SelectSpec {
        let mut spec = SelectSpec::new(&self.meta.table, BASE_ALIAS);
        spec.joins = self.planner.joins().to_vec();
        spec.predicates = self.predicates.clone();
        spec
    }

    fn writable_column(&self, name: &str) -> Result<String> {
        let field = self.meta.field(name).ok_or_else(|| OrmError::Resolution {
            entity: self.meta.name.clone(),
            segment: name.to_string(),
        })?;
        if !field.has_column() {
            return Err(OrmError::Filter(format!(
                "many-to-many field '{name}' has no column; write junction rows instead"
            )));
        }
        Ok(field.db_column.clone())
    }

    fn arg_value(&self, arg: Arg) -> Result<SqlValue> {
        match arg {
            Arg::Value(value) => Ok(value),
            Arg::Record(record) => self.coerce_record(&record),
            Arg::List(_) => Err(OrmError::Filter(String::from(
                "list value is only valid with the IN operator",
            ))),
        }
    }

    /// Coerces a loaded record to its primary key value.
    fn coerce_record(&self, record: &Record) -> Result<SqlValue> {
        let meta = self.registry.meta(record.entity())?;
        record
            .get(&meta.pk().db_column)
            .or_else(|| record.get("pk"))
            .cloned()
            .ok_or_else(|| {
                OrmError::Filter(format!(
                    "record for '{}' has no primary key value",
                    record.entity()
                ))
            })
    }
}
