//! Field declarations and their normalized forms.
//!
//! Declarations (`FieldDef`) are what callers write; normalization
//! turns them into `FieldSpec`s with every default filled in. Both
//! sides are closed sum types so the resolver can match exhaustively
//! on relation kind.

/// Behavior applied to dependent rows when their referenced row is
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete the dependent rows too.
    Cascade,
    /// Null out the referencing column.
    Blank,
    /// Null out the referencing column.
    SetNull,
}

impl OnDelete {
    /// Whether the policy nulls the referencing column instead of
    /// deleting rows.
    #[must_use]
    pub const fn is_nulling(self) -> bool {
        matches!(self, Self::Blank | Self::SetNull)
    }
}

/// A foreign key declaration referencing another entity.
#[derive(Debug, Clone)]
pub struct ForeignKeyDef {
    /// The referenced entity name.
    pub target: String,
    /// Field on the target to join against (defaults to `pk`).
    pub remote_field: Option<String>,
    /// On-delete policy (defaults to cascade).
    pub on_delete: Option<OnDelete>,
    /// Reverse accessor name on the target (defaults to
    /// `<entity>_set`).
    pub related_name: Option<String>,
}

impl ForeignKeyDef {
    /// Creates a foreign key declaration to the given entity.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            remote_field: None,
            on_delete: None,
            related_name: None,
        }
    }

    /// Sets the field on the target to join against.
    #[must_use]
    pub fn remote_field(mut self, field: impl Into<String>) -> Self {
        self.remote_field = Some(field.into());
        self
    }

    /// Sets the on-delete policy.
    #[must_use]
    pub fn on_delete(mut self, policy: OnDelete) -> Self {
        self.on_delete = Some(policy);
        self
    }

    /// Sets the reverse accessor name registered on the target.
    #[must_use]
    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        self.related_name = Some(name.into());
        self
    }
}

/// A many-to-many declaration referencing another entity.
#[derive(Debug, Clone)]
pub struct ManyToManyDef {
    /// The related entity name.
    pub target: String,
    /// Explicit junction entity (a junction is synthesized when
    /// absent).
    pub through: Option<String>,
    /// Reverse accessor name on the target.
    pub related_name: Option<String>,
}

impl ManyToManyDef {
    /// Creates a many-to-many declaration to the given entity.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            through: None,
            related_name: None,
        }
    }

    /// Routes the relation through an explicitly declared junction
    /// entity.
    #[must_use]
    pub fn through(mut self, entity: impl Into<String>) -> Self {
        self.through = Some(entity.into());
        self
    }

    /// Sets the reverse accessor name registered on the target.
    #[must_use]
    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        self.related_name = Some(name.into());
        self
    }
}

/// The declared kind of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// 64-bit integer.
    Integer,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Boolean.
    Boolean,
    /// Short string.
    String,
    /// Unbounded text.
    Text,
    /// Password hash (stored as text, never logged).
    Password,
    /// Timestamp without timezone.
    Timestamp,
    /// Calendar date.
    Date,
    /// Foreign key to another entity.
    ForeignKey(ForeignKeyDef),
    /// One-to-one link to another entity.
    OneToOne(ForeignKeyDef),
    /// Many-to-many relation through a junction entity.
    ManyToMany(ManyToManyDef),
}

/// A declared field, before normalization.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) kind: FieldKind,
    pub(crate) db_column: Option<String>,
    pub(crate) nullable: bool,
    pub(crate) verbose_label: Option<String>,
}

impl FieldDef {
    const fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            db_column: None,
            nullable: false,
            verbose_label: None,
        }
    }

    /// Declares an integer field.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    /// Declares a float field.
    #[must_use]
    pub const fn float() -> Self {
        Self::of(FieldKind::Float)
    }

    /// Declares a double field.
    #[must_use]
    pub const fn double() -> Self {
        Self::of(FieldKind::Double)
    }

    /// Declares a boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    /// Declares a string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldKind::String)
    }

    /// Declares a text field.
    #[must_use]
    pub const fn text() -> Self {
        Self::of(FieldKind::Text)
    }

    /// Declares a password field.
    #[must_use]
    pub const fn password() -> Self {
        Self::of(FieldKind::Password)
    }

    /// Declares a timestamp field.
    #[must_use]
    pub const fn timestamp() -> Self {
        Self::of(FieldKind::Timestamp)
    }

    /// Declares a date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::of(FieldKind::Date)
    }

    /// Declares a foreign key with defaults; use [`ForeignKeyDef`] for
    /// the full form.
    pub fn foreign_key(target: impl Into<String>) -> Self {
        Self::of(FieldKind::ForeignKey(ForeignKeyDef::new(target)))
    }

    /// Declares a one-to-one link with defaults.
    pub fn one_to_one(target: impl Into<String>) -> Self {
        Self::of(FieldKind::OneToOne(ForeignKeyDef::new(target)))
    }

    /// Declares a many-to-many relation with defaults; use
    /// [`ManyToManyDef`] for the full form.
    pub fn many_to_many(target: impl Into<String>) -> Self {
        Self::of(FieldKind::ManyToMany(ManyToManyDef::new(target)))
    }

    /// Overrides the database column name.
    #[must_use]
    pub fn db_column(mut self, column: impl Into<String>) -> Self {
        self.db_column = Some(column.into());
        self
    }

    /// Marks the field as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets a human-readable label.
    #[must_use]
    pub fn verbose_label(mut self, label: impl Into<String>) -> Self {
        self.verbose_label = Some(label.into());
        self
    }
}

impl From<ForeignKeyDef> for FieldDef {
    fn from(def: ForeignKeyDef) -> Self {
        Self::of(FieldKind::ForeignKey(def))
    }
}

impl From<ManyToManyDef> for FieldDef {
    fn from(def: ManyToManyDef) -> Self {
        Self::of(FieldKind::ManyToMany(def))
    }
}

/// A normalized forward relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    /// Target entity name.
    pub target: String,
    /// Field on the target the join lands on.
    pub remote_field: String,
    /// On-delete policy of the reverse direction.
    pub on_delete: OnDelete,
    /// Reverse accessor registered on the target.
    pub accessor: String,
}

/// A normalized many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToManySpec {
    /// Far entity name.
    pub target: String,
    /// Junction entity name (declared or synthesized).
    pub through: String,
    /// Reverse accessor registered on the target.
    pub accessor: String,
}

/// The normalized type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Synthesized primary key.
    Ident,
    /// 64-bit integer.
    Integer,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Boolean.
    Boolean,
    /// Short string.
    String,
    /// Unbounded text.
    Text,
    /// Password hash.
    Password,
    /// Timestamp without timezone.
    Timestamp,
    /// Calendar date.
    Date,
    /// Foreign key.
    ForeignKey(RelationSpec),
    /// One-to-one link.
    OneToOne(RelationSpec),
    /// Many-to-many relation.
    ManyToMany(ManyToManySpec),
}

impl FieldType {
    /// Whether the field crosses to another entity.
    #[must_use]
    pub const fn is_relation(&self) -> bool {
        matches!(
            self,
            Self::ForeignKey(_) | Self::OneToOne(_) | Self::ManyToMany(_)
        )
    }

    /// The forward relation spec, for single-valued relations.
    #[must_use]
    pub const fn relation(&self) -> Option<&RelationSpec> {
        match self {
            Self::ForeignKey(rel) | Self::OneToOne(rel) => Some(rel),
            _ => None,
        }
    }

    /// A short kind name used by the schema-spec boundary.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Ident => "ident",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Text => "text",
            Self::Password => "password",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::ForeignKey(_) => "foreignkey",
            Self::OneToOne(_) => "onetoone",
            Self::ManyToMany(_) => "manytomany",
        }
    }
}

/// A normalized field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Database column (empty for many-to-many, which has no column of
    /// its own).
    pub db_column: String,
    /// Normalized type.
    pub ty: FieldType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Human-readable label.
    pub verbose_label: Option<String>,
}

impl FieldSpec {
    /// Whether the field maps to a physical column.
    #[must_use]
    pub const fn has_column(&self) -> bool {
        !matches!(self.ty, FieldType::ManyToMany(_))
    }
}

/// The kind of a synthesized reverse relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseKind {
    /// Reverse of a foreign key (one-to-many).
    ForeignKey,
    /// Reverse of a one-to-one link.
    OneToOne,
    /// Reverse of a many-to-many relation.
    ManyToMany {
        /// Junction entity name.
        through: String,
    },
}

/// A synthesized reverse relation, stored on the target entity's side
/// of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseSpec {
    /// The entity that declared the forward relation.
    pub source: String,
    /// The declaring field on the source entity.
    pub source_field: String,
    /// Reverse kind.
    pub kind: ReverseKind,
    /// On-delete policy of the forward declaration.
    pub on_delete: OnDelete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_delete_nulling() {
        assert!(OnDelete::Blank.is_nulling());
        assert!(OnDelete::SetNull.is_nulling());
        assert!(!OnDelete::Cascade.is_nulling());
    }

    #[test]
    fn test_foreign_key_builder() {
        let def = ForeignKeyDef::new("user")
            .on_delete(OnDelete::SetNull)
            .related_name("entries");
        assert_eq!(def.target, "user");
        assert_eq!(def.on_delete, Some(OnDelete::SetNull));
        assert_eq!(def.related_name.as_deref(), Some("entries"));
    }

    #[test]
    fn test_field_type_relation_access() {
        let rel = RelationSpec {
            target: String::from("user"),
            remote_field: String::from("pk"),
            on_delete: OnDelete::Cascade,
            accessor: String::from("blog_set"),
        };
        let ty = FieldType::ForeignKey(rel.clone());
        assert!(ty.is_relation());
        assert_eq!(ty.relation(), Some(&rel));
        assert!(FieldType::Integer.relation().is_none());
    }
}
