//! The entity registry: a lazily-populated cache mapping entity name
//! to normalized metadata.
//!
//! The registry is an explicit value owned by the caller and shared
//! by cloning the handle; there is no global. Normalization happens on
//! first access per name and is memoized; reverse accessors and synthesized
//! junction entities are recorded here as normalization side effects,
//! guarded by one write lock so concurrent first use stays consistent.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ferrite_sql_core::dialect::{Dialect, SqliteDialect};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::meta::entity::{EntityDecl, EntityMeta};
use crate::meta::field::{
    FieldDef, FieldKind, FieldSpec, FieldType, ForeignKeyDef, ManyToManyDef, ManyToManySpec,
    OnDelete, RelationSpec, ReverseKind, ReverseSpec,
};
use crate::query::Query;
use crate::schema::TableSpec;

#[derive(Default)]
struct Inner {
    decls: BTreeMap<String, EntityDecl>,
    metas: BTreeMap<String, Arc<EntityMeta>>,
    reverses: BTreeMap<String, BTreeMap<String, ReverseSpec>>,
}

struct Shared {
    dialect: Arc<dyn Dialect + Send + Sync>,
    inner: RwLock<Inner>,
}

/// Entity name → metadata cache, plus the dialect used by builders it
/// spawns.
///
/// A `Registry` is a cheap-clone handle (the same shape as a
/// connection pool): clones share one cache, and the caller owns the
/// lifecycle. There is no process-wide singleton.
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry compiling for SQLite.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dialect(SqliteDialect::new())
    }

    /// Creates a registry compiling for the given dialect.
    pub fn with_dialect(dialect: impl Dialect + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                dialect: Arc::new(dialect),
                inner: RwLock::new(Inner::default()),
            }),
        }
    }

    /// Returns the dialect queries from this registry compile with.
    #[must_use]
    pub fn dialect(&self) -> Arc<dyn Dialect + Send + Sync> {
        Arc::clone(&self.shared.dialect)
    }

    /// Records an entity declaration.
    ///
    /// # Errors
    ///
    /// Fails when the name is already taken.
    pub fn declare(&self, decl: EntityDecl) -> Result<()> {
        let mut inner = self.write();
        let name = decl.name().to_string();
        if inner.decls.contains_key(&name) || inner.metas.contains_key(&name) {
            return Err(OrmError::Config(format!(
                "entity '{name}' is already declared"
            )));
        }
        inner.decls.insert(name, decl);
        Ok(())
    }

    /// Returns normalized metadata for the named entity, normalizing
    /// it on first access.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error for unknown entities or bad
    /// declarations.
    pub fn meta(&self, name: &str) -> Result<Arc<EntityMeta>> {
        if let Some(meta) = self.read().metas.get(name) {
            return Ok(Arc::clone(meta));
        }
        normalize_locked(&mut self.write(), name)
    }

    /// Looks up a reverse accessor on an entity.
    ///
    /// A miss normalizes any still-pending declarations once (reverse
    /// entries only exist after their declaring side normalized), then
    /// retries.
    ///
    /// # Errors
    ///
    /// Fails when normalizing a pending declaration fails.
    pub fn reverse(&self, entity: &str, accessor: &str) -> Result<Option<ReverseSpec>> {
        if let Some(rev) = self.read().reverses.get(entity).and_then(|m| m.get(accessor)) {
            return Ok(Some(rev.clone()));
        }
        let mut inner = self.write();
        normalize_pending(&mut inner)?;
        Ok(inner
            .reverses
            .get(entity)
            .and_then(|m| m.get(accessor))
            .cloned())
    }

    /// Returns every reverse relation of an entity, accessor-ordered.
    ///
    /// # Errors
    ///
    /// Fails when normalizing a pending declaration fails.
    pub fn reverses_of(&self, entity: &str) -> Result<Vec<ReverseSpec>> {
        let mut inner = self.write();
        normalize_pending(&mut inner)?;
        Ok(inner
            .reverses
            .get(entity)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Normalizes every declared entity.
    ///
    /// # Errors
    ///
    /// Fails on the first bad declaration.
    pub fn normalize_all(&self) -> Result<()> {
        normalize_pending(&mut self.write())
    }

    /// Returns the names of all declared entities, synthesized
    /// junctions included once normalized.
    #[must_use]
    pub fn entity_names(&self) -> Vec<String> {
        let inner = self.read();
        let mut names: Vec<String> = inner.decls.keys().cloned().collect();
        for name in inner.metas.keys() {
            if !inner.decls.contains_key(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// Starts a query against the named entity.
    ///
    /// # Errors
    ///
    /// Fails when the entity is unknown.
    pub fn query(&self, entity: &str) -> Result<Query> {
        let meta = self.meta(entity)?;
        Ok(Query::new(self.clone(), meta, self.dialect()))
    }

    /// Produces the schema-spec view of an entity for migration
    /// tooling.
    ///
    /// # Errors
    ///
    /// Fails when the entity is unknown.
    pub fn table_spec(&self, entity: &str) -> Result<TableSpec> {
        Ok(TableSpec::from_meta(&*self.meta(entity)?))
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.shared
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.shared
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn known_entity(inner: &Inner, name: &str) -> bool {
    inner.decls.contains_key(name) || inner.metas.contains_key(name)
}

fn normalize_pending(inner: &mut Inner) -> Result<()> {
    let pending: Vec<String> = inner
        .decls
        .keys()
        .filter(|name| !inner.metas.contains_key(*name))
        .cloned()
        .collect();
    for name in pending {
        normalize_locked(inner, &name)?;
    }
    Ok(())
}

fn normalize_locked(inner: &mut Inner, name: &str) -> Result<Arc<EntityMeta>> {
    if let Some(meta) = inner.metas.get(name) {
        return Ok(Arc::clone(meta));
    }
    let decl = inner
        .decls
        .get(name)
        .cloned()
        .ok_or_else(|| OrmError::Config(format!("unknown entity '{name}'")))?;

    let table = decl.table.clone().unwrap_or_else(|| decl.name.clone());
    let mut fields = Vec::with_capacity(decl.fields.len() + 1);
    fields.push(FieldSpec {
        name: String::from("pk"),
        db_column: format!("{name}_id"),
        ty: FieldType::Ident,
        nullable: false,
        verbose_label: None,
    });
    let mut indexes = Vec::new();

    for (fname, def) in &decl.fields {
        if fields.iter().any(|f: &FieldSpec| f.name == *fname) {
            return Err(OrmError::Config(format!(
                "duplicate field '{fname}' on entity '{name}'"
            )));
        }
        let spec = match &def.kind {
            FieldKind::Integer => plain_field(fname, def, FieldType::Integer),
            FieldKind::Float => plain_field(fname, def, FieldType::Float),
            FieldKind::Double => plain_field(fname, def, FieldType::Double),
            FieldKind::Boolean => plain_field(fname, def, FieldType::Boolean),
            FieldKind::String => plain_field(fname, def, FieldType::String),
            FieldKind::Text => plain_field(fname, def, FieldType::Text),
            FieldKind::Password => plain_field(fname, def, FieldType::Password),
            FieldKind::Timestamp => plain_field(fname, def, FieldType::Timestamp),
            FieldKind::Date => plain_field(fname, def, FieldType::Date),
            FieldKind::ForeignKey(rel) => {
                forward_relation(inner, name, fname, def, rel, false, &mut indexes)?
            }
            FieldKind::OneToOne(rel) => {
                forward_relation(inner, name, fname, def, rel, true, &mut indexes)?
            }
            FieldKind::ManyToMany(m2m) => many_to_many(inner, name, fname, def, m2m)?,
        };
        fields.push(spec);
    }

    let meta = Arc::new(EntityMeta::new(
        decl.name.clone(),
        table,
        decl.junction,
        fields,
        indexes,
    ));
    inner.metas.insert(name.to_string(), Arc::clone(&meta));
    Ok(meta)
}

fn plain_field(fname: &str, def: &FieldDef, ty: FieldType) -> FieldSpec {
    FieldSpec {
        name: fname.to_string(),
        db_column: def.db_column.clone().unwrap_or_else(|| fname.to_string()),
        ty,
        nullable: def.nullable,
        verbose_label: def.verbose_label.clone(),
    }
}

fn forward_relation(
    inner: &mut Inner,
    entity: &str,
    fname: &str,
    def: &FieldDef,
    rel: &ForeignKeyDef,
    one_to_one: bool,
    indexes: &mut Vec<String>,
) -> Result<FieldSpec> {
    if !known_entity(inner, &rel.target) {
        return Err(OrmError::Config(format!(
            "unknown entity '{}' referenced by {entity}.{fname}",
            rel.target
        )));
    }
    let db_column = def
        .db_column
        .clone()
        .unwrap_or_else(|| format!("{fname}_id"));
    let remote_field = rel
        .remote_field
        .clone()
        .unwrap_or_else(|| String::from("pk"));
    let on_delete = rel.on_delete.unwrap_or(if one_to_one {
        OnDelete::Blank
    } else {
        OnDelete::Cascade
    });
    let accessor = rel
        .related_name
        .clone()
        .unwrap_or_else(|| format!("{entity}_set"));

    register_reverse(
        inner,
        &rel.target,
        &accessor,
        ReverseSpec {
            source: entity.to_string(),
            source_field: fname.to_string(),
            kind: if one_to_one {
                ReverseKind::OneToOne
            } else {
                ReverseKind::ForeignKey
            },
            on_delete,
        },
    )?;
    indexes.push(db_column.clone());

    let spec = RelationSpec {
        target: rel.target.clone(),
        remote_field,
        on_delete,
        accessor,
    };
    Ok(FieldSpec {
        name: fname.to_string(),
        db_column,
        ty: if one_to_one {
            FieldType::OneToOne(spec)
        } else {
            FieldType::ForeignKey(spec)
        },
        nullable: def.nullable,
        verbose_label: def.verbose_label.clone(),
    })
}

fn many_to_many(
    inner: &mut Inner,
    entity: &str,
    fname: &str,
    def: &FieldDef,
    m2m: &ManyToManyDef,
) -> Result<FieldSpec> {
    if !known_entity(inner, &m2m.target) {
        return Err(OrmError::Config(format!(
            "unknown entity '{}' referenced by {entity}.{fname}",
            m2m.target
        )));
    }
    let through = match &m2m.through {
        Some(junction) => {
            if !known_entity(inner, junction) {
                return Err(OrmError::Config(format!(
                    "unknown junction entity '{junction}' for {entity}.{fname}"
                )));
            }
            junction.clone()
        }
        None => synthesize_junction(inner, entity, &m2m.target)?,
    };
    let accessor = m2m
        .related_name
        .clone()
        .unwrap_or_else(|| format!("{entity}_set"));

    register_reverse(
        inner,
        &m2m.target,
        &accessor,
        ReverseSpec {
            source: entity.to_string(),
            source_field: fname.to_string(),
            kind: ReverseKind::ManyToMany {
                through: through.clone(),
            },
            on_delete: OnDelete::Cascade,
        },
    )?;

    Ok(FieldSpec {
        name: fname.to_string(),
        db_column: String::new(),
        ty: FieldType::ManyToMany(ManyToManySpec {
            target: m2m.target.clone(),
            through,
            accessor,
        }),
        nullable: def.nullable,
        verbose_label: def.verbose_label.clone(),
    })
}

/// Synthesizes the junction entity for an undeclared many-to-many
/// relation.
///
/// The name derives from the two entity names in lexical order, so the
/// same junction is reused regardless of which side declares first.
/// The junction's reverse accessors are `<junction>_lhs` and
/// `<junction>_rhs`; a `_set` pair would collide on a
/// self-referential relation.
fn synthesize_junction(inner: &mut Inner, a: &str, b: &str) -> Result<String> {
    let (lhs, rhs) = if a <= b { (a, b) } else { (b, a) };
    let name = format!("{lhs}_{rhs}");
    if known_entity(inner, &name) {
        return Ok(name);
    }
    debug!(junction = %name, "synthesizing junction entity");
    let decl = EntityDecl::new(&name)
        .field(
            "lhs",
            ForeignKeyDef::new(lhs).related_name(format!("{name}_lhs")),
        )
        .field(
            "rhs",
            ForeignKeyDef::new(rhs).related_name(format!("{name}_rhs")),
        )
        .junction();
    inner.decls.insert(name.clone(), decl);
    normalize_locked(inner, &name)?;
    Ok(name)
}

fn register_reverse(
    inner: &mut Inner,
    target: &str,
    accessor: &str,
    spec: ReverseSpec,
) -> Result<()> {
    let entry = inner.reverses.entry(target.to_string()).or_default();
    if entry.contains_key(accessor) {
        return Err(OrmError::Config(format!(
            "duplicate reverse accessor '{accessor}' on entity '{target}' \
             (declared by {}.{})",
            spec.source, spec.source_field
        )));
    }
    entry.insert(accessor.to_string(), spec);
    Ok(())
}
