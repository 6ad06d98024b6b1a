//! Cascade planning for deletes.
//!
//! Deleting rows must first satisfy every reverse relation's
//! on-delete policy: junction rows disappear with either endpoint,
//! cascading children are deleted before their parent, and nulling
//! policies emit UPDATEs. Dependent rows are restricted with nested
//! `IN (SELECT …)` subqueries so a filtered delete cascades
//! precisely. The returned batch is ordered for execution inside one
//! transaction.

use std::sync::Arc;

use ferrite_sql_core::{
    ColumnRef, DeleteSpec, Dialect, Predicate, SelectSpec, SqlStatement, SqlValue, UpdateSpec,
};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::meta::{EntityMeta, OnDelete, Registry, ReverseKind, ReverseSpec};
use crate::query::planner::BASE_ALIAS;

/// Plans the ordered statement batch for deleting the given row set.
pub(crate) fn plan_delete(
    registry: &Registry,
    dialect: &dyn Dialect,
    meta: &Arc<EntityMeta>,
    rows: &SelectSpec,
) -> Result<Vec<SqlStatement>> {
    let mut statements = Vec::new();
    let mut stack = Vec::new();
    plan_related(registry, dialect, meta, rows, &mut statements, &mut stack)?;
    statements.push(dialect.compile_delete(&DeleteSpec {
        table: meta.table.clone(),
        pk_column: meta.pk().db_column.clone(),
        rows: rows.clone(),
    })?);
    debug!(
        entity = %meta.name,
        statements = statements.len(),
        "planned cascade delete"
    );
    Ok(statements)
}

/// Emits the dependent statements for one entity's row set, children
/// before parents. `stack` tracks (entity, field) pairs on the
/// current recursion path so a self-referential cascade plans one
/// nesting level instead of recursing forever.
fn plan_related(
    registry: &Registry,
    dialect: &dyn Dialect,
    entity: &Arc<EntityMeta>,
    rows: &SelectSpec,
    out: &mut Vec<SqlStatement>,
    stack: &mut Vec<(String, String)>,
) -> Result<()> {
    let (sub_sql, sub_params) = pk_subselect(rows, &entity.pk().db_column);
    let reverses = registry.reverses_of(&entity.name)?;

    // Junction rows lose their meaning with either endpoint, so they
    // are deleted first regardless of the declared policy.
    for rev in &reverses {
        if !is_key_reverse(rev) {
            continue;
        }
        let child = registry.meta(&rev.source)?;
        if !child.junction {
            continue;
        }
        let fk_column = source_column(&child, rev)?;
        out.push(dialect.compile_delete(&DeleteSpec {
            table: child.table.clone(),
            pk_column: child.pk().db_column.clone(),
            rows: restricted(&child.table, &fk_column, &sub_sql, &sub_params),
        })?);
    }

    for rev in &reverses {
        if !is_key_reverse(rev) {
            continue;
        }
        let child = registry.meta(&rev.source)?;
        if child.junction {
            continue;
        }
        let fk_column = source_column(&child, rev)?;
        let child_rows = restricted(&child.table, &fk_column, &sub_sql, &sub_params);
        match rev.on_delete {
            OnDelete::Cascade => {
                let frame = (child.name.clone(), rev.source_field.clone());
                if !stack.contains(&frame) {
                    stack.push(frame);
                    plan_related(registry, dialect, &child, &child_rows, out, stack)?;
                    stack.pop();
                }
                out.push(dialect.compile_delete(&DeleteSpec {
                    table: child.table.clone(),
                    pk_column: child.pk().db_column.clone(),
                    rows: child_rows,
                })?);
            }
            OnDelete::Blank | OnDelete::SetNull => {
                out.push(dialect.compile_update(&UpdateSpec {
                    table: child.table.clone(),
                    pk_column: child.pk().db_column.clone(),
                    assignments: vec![(fk_column, SqlValue::Null)],
                    rows: child_rows,
                })?);
            }
        }
    }
    Ok(())
}

/// Reverse entries that hold a key column on the child side.
/// Many-to-many reverses carry no column of their own; their rows
/// live on the junction, which has its own key reverses.
fn is_key_reverse(rev: &ReverseSpec) -> bool {
    matches!(rev.kind, ReverseKind::ForeignKey | ReverseKind::OneToOne)
}

fn source_column(child: &Arc<EntityMeta>, rev: &ReverseSpec) -> Result<String> {
    child
        .field(&rev.source_field)
        .map(|f| f.db_column.clone())
        .ok_or_else(|| {
            OrmError::Config(format!(
                "reverse accessor points at missing field {}.{}",
                rev.source, rev.source_field
            ))
        })
}

fn restricted(table: &str, fk_column: &str, sub_sql: &str, sub_params: &[SqlValue]) -> SelectSpec {
    let mut rows = SelectSpec::new(table, BASE_ALIAS);
    rows.predicates.push(Predicate::InSubquery {
        column: ColumnRef::new(BASE_ALIAS, fk_column),
        subquery: sub_sql.to_string(),
        params: sub_params.to_vec(),
    });
    rows
}

/// Renders the primary-key subselect of a row set, used to restrict
/// dependent rows.
fn pk_subselect(rows: &SelectSpec, pk_column: &str) -> (String, Vec<SqlValue>) {
    let mut params = Vec::new();
    let mut sql = format!(
        "SELECT {}.{} FROM {}",
        rows.from.alias,
        pk_column,
        rows.render_from()
    );
    if let Some(body) = rows.render_where(true, &mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&body);
    }
    (sql, params)
}
