//! The schema-spec boundary consumed by migration tooling.
//!
//! These types are a read-only projection of normalized metadata;
//! the compiler never emits DDL itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::meta::EntityMeta;

/// The schema view of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field kind name (`integer`, `foreignkey`, …).
    #[serde(rename = "type")]
    pub ty: String,
    /// Mapped database column.
    pub db_column: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
}

/// The schema view of a single entity's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub table: String,
    /// Columns keyed by field name.
    pub columns: BTreeMap<String, ColumnSpec>,
    /// Indexed columns.
    pub indexes: Vec<String>,
}

impl TableSpec {
    /// Projects normalized metadata into the schema-spec shape.
    ///
    /// Many-to-many fields are skipped: their storage lives on the
    /// junction entity's own table spec.
    #[must_use]
    pub fn from_meta(meta: &EntityMeta) -> Self {
        let columns = meta
            .data_fields()
            .map(|f| {
                (
                    f.name.clone(),
                    ColumnSpec {
                        ty: f.ty.kind_name().to_string(),
                        db_column: f.db_column.clone(),
                        nullable: f.nullable,
                        primary_key: f.name == "pk",
                    },
                )
            })
            .collect();
        Self {
            table: meta.table.clone(),
            columns,
            indexes: meta.indexes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EntityDecl, FieldDef, Registry};

    #[test]
    fn test_table_spec_projection() {
        let registry = Registry::new();
        registry
            .declare(EntityDecl::new("user").field("name", FieldDef::string()))
            .unwrap();
        registry
            .declare(
                EntityDecl::new("blog")
                    .field("title", FieldDef::string())
                    .field("author", FieldDef::foreign_key("user"))
                    .field("tags", FieldDef::many_to_many("user")),
            )
            .unwrap();

        let spec = registry.table_spec("blog").unwrap();
        assert_eq!(spec.table, "blog");
        assert!(spec.columns.contains_key("pk"));
        assert!(spec.columns["pk"].primary_key);
        assert_eq!(spec.columns["author"].db_column, "author_id");
        // Many-to-many has no column of its own.
        assert!(!spec.columns.contains_key("tags"));
        assert_eq!(spec.indexes, vec![String::from("author_id")]);
    }

    #[test]
    fn test_table_spec_serializes() {
        let registry = Registry::new();
        registry
            .declare(EntityDecl::new("user").field("name", FieldDef::string()))
            .unwrap();
        let spec = registry.table_spec("user").unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let back: TableSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
