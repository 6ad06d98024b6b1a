//! Entity declarations and normalized metadata.

use std::collections::BTreeMap;

use super::field::{FieldDef, FieldSpec, FieldType};

/// A raw entity declaration: a name, an optional table override, and
/// an ordered field list.
///
/// Declarations are normalized by the
/// [`Registry`](crate::meta::Registry): a `pk` field is synthesized,
/// relation defaults are filled in, reverse accessors are registered
/// on targets, and undeclared many-to-many junctions are synthesized.
#[derive(Debug, Clone)]
pub struct EntityDecl {
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<(String, FieldDef)>,
    pub(crate) junction: bool,
}

impl EntityDecl {
    /// Creates a declaration for the named entity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            junction: false,
        }
    }

    /// Overrides the table name (defaults to the entity name).
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a field to the declaration.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FieldDef>) -> Self {
        self.fields.push((name.into(), def.into()));
        self
    }

    /// Returns the declared entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn junction(mut self) -> Self {
        self.junction = true;
        self
    }
}

/// Normalized entity metadata: the canonical field table.
///
/// Created once per entity name and cached by the registry for its
/// lifetime; shared read-only between queries.
#[derive(Debug)]
pub struct EntityMeta {
    /// Entity name.
    pub name: String,
    /// Mapped table name.
    pub table: String,
    /// Whether this entity implements a many-to-many relation.
    pub junction: bool,
    /// Indexed local columns (one per forward relation).
    pub indexes: Vec<String>,
    fields: Vec<FieldSpec>,
    by_name: BTreeMap<String, usize>,
}

impl EntityMeta {
    pub(crate) fn new(
        name: String,
        table: String,
        junction: bool,
        fields: Vec<FieldSpec>,
        indexes: Vec<String>,
    ) -> Self {
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            name,
            table,
            junction,
            indexes,
            fields,
            by_name,
        }
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Returns the primary key field (always present, always first).
    #[must_use]
    pub fn pk(&self) -> &FieldSpec {
        &self.fields[0]
    }

    /// All fields in declaration order, `pk` first.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields that map to physical columns (skips many-to-many).
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.has_column())
    }

    /// Forward relation fields in declaration order.
    pub fn relation_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.ty.is_relation())
    }

    /// Foreign-key fields, used to find a junction's two legs.
    pub(crate) fn foreign_keys(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|f| matches!(f.ty, FieldType::ForeignKey(_) | FieldType::OneToOne(_)))
    }
}
