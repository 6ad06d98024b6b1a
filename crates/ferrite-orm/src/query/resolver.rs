//! Path resolution: turning a dotted field path into joins and a
//! final column.
//!
//! A path like `blog__the_user__profile_set__age` is split on `__`;
//! every leading segment must name a relation (a field on the current
//! entity, or a reverse accessor registered by the other side), and
//! each hop asks the planner for a join. The final segment may be a
//! plain field, or a relation, in which case the walk stops at the
//! nearest key column that carries the related value (half-join)
//! unless full joins were requested.

use std::sync::Arc;

use ferrite_sql_core::JoinKind;

use crate::error::{OrmError, Result};
use crate::meta::{EntityMeta, FieldSpec, FieldType, Registry, RelationSpec, ReverseKind,
    ReverseSpec};
use crate::query::planner::{JoinPlanner, JoinRequest, BASE_ALIAS};

/// Separator between path segments.
pub(crate) const PATH_SEPARATOR: &str = "__";

/// How a resolution should join.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolveOptions {
    /// Join type for relation hops (the junction leg of a
    /// many-to-many is always LEFT).
    pub join_kind: JoinKind,
    /// Whether a trailing relation segment must still be joined.
    /// Eager loads retrieve data and cannot stop at the parent-side
    /// key.
    pub full_joins: bool,
}

impl ResolveOptions {
    /// Options for `filter`/`order_by` paths.
    pub(crate) const fn filter() -> Self {
        Self {
            join_kind: JoinKind::Inner,
            full_joins: false,
        }
    }

    /// Options for `with` paths (eager-load semantics).
    pub(crate) const fn eager() -> Self {
        Self {
            join_kind: JoinKind::Left,
            full_joins: true,
        }
    }
}

/// The landing point of a resolved path.
#[derive(Debug)]
pub(crate) struct Resolved {
    /// Entity owning the final column.
    pub entity: Arc<EntityMeta>,
    /// Alias of the table the column lives on.
    pub alias: String,
    /// Database column name.
    pub column: String,
}

/// Resolves a dotted path starting from `base`, planning joins as
/// needed.
pub(crate) fn resolve_path(
    registry: &Registry,
    base: &Arc<EntityMeta>,
    planner: &mut JoinPlanner,
    path: &str,
    opts: ResolveOptions,
) -> Result<Resolved> {
    let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    // `author__pk` resolves identically to `author`.
    if segments.len() > 1 && segments[segments.len() - 1] == "pk" {
        segments.pop();
    }
    let Some(last) = segments.pop() else {
        return Err(OrmError::Resolution {
            entity: base.name.clone(),
            segment: path.to_string(),
        });
    };

    let mut entity = Arc::clone(base);
    let mut alias = String::from(BASE_ALIAS);
    for segment in &segments {
        let (next_entity, next_alias) = hop(registry, &entity, &alias, segment, planner, opts)?;
        entity = next_entity;
        alias = next_alias;
    }
    resolve_terminal(registry, &entity, alias, last, planner, opts)
}

fn hop(
    registry: &Registry,
    entity: &Arc<EntityMeta>,
    alias: &str,
    segment: &str,
    planner: &mut JoinPlanner,
    opts: ResolveOptions,
) -> Result<(Arc<EntityMeta>, String)> {
    if let Some(field) = entity.field(segment) {
        return match &field.ty {
            FieldType::ForeignKey(rel) | FieldType::OneToOne(rel) => {
                let rel = rel.clone();
                let local_column = field.db_column.clone();
                forward_join(registry, entity, alias, &local_column, &rel, opts.join_kind, planner)
            }
            FieldType::ManyToMany(m2m) => {
                let m2m = m2m.clone();
                let resolved = junction_traverse(
                    registry, entity, alias, &m2m.through, &m2m.target, true, opts, planner,
                    false,
                )?;
                Ok((resolved.entity, resolved.alias))
            }
            _ => Err(OrmError::Resolution {
                entity: entity.name.clone(),
                segment: segment.to_string(),
            }),
        };
    }
    if let Some(rev) = registry.reverse(&entity.name, segment)? {
        return match rev.kind {
            ReverseKind::ForeignKey | ReverseKind::OneToOne => {
                reverse_join(registry, entity, alias, &rev, opts.join_kind, planner)
            }
            ReverseKind::ManyToMany { ref through } => {
                let resolved = junction_traverse(
                    registry, entity, alias, through, &rev.source, false, opts, planner, false,
                )?;
                Ok((resolved.entity, resolved.alias))
            }
        };
    }
    Err(OrmError::Resolution {
        entity: entity.name.clone(),
        segment: segment.to_string(),
    })
}

fn resolve_terminal(
    registry: &Registry,
    entity: &Arc<EntityMeta>,
    alias: String,
    last: &str,
    planner: &mut JoinPlanner,
    opts: ResolveOptions,
) -> Result<Resolved> {
    if let Some(field) = entity.field(last) {
        return match &field.ty {
            FieldType::ForeignKey(rel) | FieldType::OneToOne(rel) => {
                if opts.full_joins {
                    let rel = rel.clone();
                    let local_column = field.db_column.clone();
                    let (target, target_alias) = forward_join(
                        registry, entity, &alias, &local_column, &rel, opts.join_kind, planner,
                    )?;
                    let column = field_column(&target, &rel.remote_field)?;
                    Ok(Resolved {
                        entity: target,
                        alias: target_alias,
                        column,
                    })
                } else {
                    // Half-join: the local key column carries the
                    // related value, so no join is needed.
                    Ok(Resolved {
                        entity: Arc::clone(entity),
                        alias,
                        column: field.db_column.clone(),
                    })
                }
            }
            FieldType::ManyToMany(m2m) => {
                let m2m = m2m.clone();
                junction_traverse(
                    registry, entity, &alias, &m2m.through, &m2m.target, true, opts, planner,
                    true,
                )
            }
            _ => Ok(Resolved {
                entity: Arc::clone(entity),
                alias,
                column: field.db_column.clone(),
            }),
        };
    }
    if let Some(rev) = registry.reverse(&entity.name, last)? {
        return match rev.kind {
            ReverseKind::ForeignKey | ReverseKind::OneToOne => {
                let (child, child_alias) =
                    reverse_join(registry, entity, &alias, &rev, opts.join_kind, planner)?;
                let column = child.pk().db_column.clone();
                Ok(Resolved {
                    entity: child,
                    alias: child_alias,
                    column,
                })
            }
            ReverseKind::ManyToMany { ref through } => junction_traverse(
                registry, entity, &alias, through, &rev.source, false, opts, planner, true,
            ),
        };
    }
    Err(OrmError::Resolution {
        entity: entity.name.clone(),
        segment: last.to_string(),
    })
}

fn forward_join(
    registry: &Registry,
    entity: &Arc<EntityMeta>,
    alias: &str,
    local_column: &str,
    rel: &RelationSpec,
    kind: JoinKind,
    planner: &mut JoinPlanner,
) -> Result<(Arc<EntityMeta>, String)> {
    let target = registry.meta(&rel.target)?;
    let remote_column = field_column(&target, &rel.remote_field)?;
    let new_alias = planner.add_join(&JoinRequest {
        left_alias: alias,
        left_entity: &entity.name,
        left_column: local_column,
        right_entity: &target.name,
        right_table: &target.table,
        right_column: &remote_column,
        kind,
    });
    Ok((target, new_alias))
}

fn reverse_join(
    registry: &Registry,
    entity: &Arc<EntityMeta>,
    alias: &str,
    rev: &ReverseSpec,
    kind: JoinKind,
    planner: &mut JoinPlanner,
) -> Result<(Arc<EntityMeta>, String)> {
    let child = registry.meta(&rev.source)?;
    let child_field = child.field(&rev.source_field).ok_or_else(|| {
        OrmError::Config(format!(
            "reverse accessor points at missing field {}.{}",
            rev.source, rev.source_field
        ))
    })?;
    let rel = child_field.ty.relation().ok_or_else(|| {
        OrmError::Config(format!(
            "reverse accessor points at non-relation field {}.{}",
            rev.source, rev.source_field
        ))
    })?;
    let left_column = field_column(entity, &rel.remote_field)?;
    let child_column = child_field.db_column.clone();
    let new_alias = planner.add_join(&JoinRequest {
        left_alias: alias,
        left_entity: &entity.name,
        left_column: &left_column,
        right_entity: &child.name,
        right_table: &child.table,
        right_column: &child_column,
        kind,
    });
    Ok((Arc::clone(&child), new_alias))
}

/// Walks entity → junction (→ far entity) for a many-to-many hop.
///
/// The local-to-junction leg always joins LEFT so traversing the
/// relation does not narrow the base result set. A terminal hop
/// without `full_joins` stops at the junction and returns its
/// far-side key column (the half-join optimization).
#[allow(clippy::too_many_arguments)]
fn junction_traverse(
    registry: &Registry,
    entity: &Arc<EntityMeta>,
    alias: &str,
    through: &str,
    far_name: &str,
    forward: bool,
    opts: ResolveOptions,
    planner: &mut JoinPlanner,
    terminal: bool,
) -> Result<Resolved> {
    let junction = registry.meta(through)?;
    let (local_leg, far_leg) = junction_legs(&junction, &entity.name, far_name, forward)?;
    let local_rel = local_leg.ty.relation().ok_or_else(|| {
        OrmError::Config(format!("junction '{}' leg is not a foreign key", junction.name))
    })?;
    let left_column = field_column(entity, &local_rel.remote_field)?;
    let junction_alias = planner.add_join(&JoinRequest {
        left_alias: alias,
        left_entity: &entity.name,
        left_column: &left_column,
        right_entity: &junction.name,
        right_table: &junction.table,
        right_column: &local_leg.db_column,
        kind: JoinKind::Left,
    });

    if terminal && !opts.full_joins {
        return Ok(Resolved {
            entity: Arc::clone(&junction),
            alias: junction_alias,
            column: far_leg.db_column,
        });
    }

    let far = registry.meta(far_name)?;
    let far_rel = far_leg.ty.relation().ok_or_else(|| {
        OrmError::Config(format!("junction '{}' leg is not a foreign key", junction.name))
    })?;
    let far_column = field_column(&far, &far_rel.remote_field)?;
    let far_alias = planner.add_join(&JoinRequest {
        left_alias: &junction_alias,
        left_entity: &junction.name,
        left_column: &far_leg.db_column,
        right_entity: &far.name,
        right_table: &far.table,
        right_column: &far_column,
        kind: opts.join_kind,
    });
    Ok(Resolved {
        entity: Arc::clone(&far),
        alias: far_alias,
        column: far_column,
    })
}

/// Finds the junction legs pointing at the local and far entities.
///
/// A self-referential junction reads `lhs → rhs` when traversed
/// forward and `rhs → lhs` through the reverse accessor.
fn junction_legs(
    junction: &Arc<EntityMeta>,
    local: &str,
    far: &str,
    forward: bool,
) -> Result<(FieldSpec, FieldSpec)> {
    let fks: Vec<&FieldSpec> = junction.foreign_keys().collect();
    if local == far {
        let legs: Vec<&FieldSpec> = fks
            .iter()
            .filter(|f| f.ty.relation().is_some_and(|r| r.target == local))
            .copied()
            .collect();
        if legs.len() < 2 {
            return Err(OrmError::Config(format!(
                "junction '{}' does not link '{local}' to itself",
                junction.name
            )));
        }
        return Ok(if forward {
            (legs[0].clone(), legs[1].clone())
        } else {
            (legs[1].clone(), legs[0].clone())
        });
    }
    let local_leg = fks
        .iter()
        .find(|f| f.ty.relation().is_some_and(|r| r.target == local));
    let far_leg = fks
        .iter()
        .find(|f| f.ty.relation().is_some_and(|r| r.target == far));
    match (local_leg, far_leg) {
        (Some(local_leg), Some(far_leg)) => Ok(((*local_leg).clone(), (*far_leg).clone())),
        _ => Err(OrmError::Config(format!(
            "junction '{}' does not link '{local}' and '{far}'",
            junction.name
        ))),
    }
}

fn field_column(meta: &EntityMeta, field: &str) -> Result<String> {
    meta.field(field)
        .map(|f| f.db_column.clone())
        .ok_or_else(|| OrmError::Resolution {
            entity: meta.name.clone(),
            segment: field.to_string(),
        })
}
