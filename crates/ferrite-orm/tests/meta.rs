//! Registry behavior across threads and the schema-spec boundary.

mod common;

use common::{blog_registry, node_registry};
use ferrite_orm::Registry;

#[test]
fn concurrent_first_use_registers_one_junction() {
    let registry = blog_registry();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry
                    .query("blog")
                    .unwrap()
                    .filter("tags", "=", 1_i64)
                    .unwrap()
                    .select()
                    .unwrap()
            })
        })
        .collect();

    let statements: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for stmt in &statements {
        assert_eq!(stmt, &statements[0]);
    }
    let junctions = registry
        .entity_names()
        .into_iter()
        .filter(|name| name == "blog_tag")
        .count();
    assert_eq!(junctions, 1);
}

#[test]
fn clones_share_one_cache() {
    let registry = blog_registry();
    let clone: Registry = registry.clone();
    let original = registry.meta("blog").unwrap();
    let shared = clone.meta("blog").unwrap();
    assert!(std::sync::Arc::ptr_eq(&original, &shared));
}

#[test]
fn junction_appears_in_schema_specs() {
    let registry = blog_registry();
    registry.normalize_all().unwrap();

    let junction = registry.table_spec("blog_tag").unwrap();
    assert_eq!(junction.table, "blog_tag");
    assert_eq!(junction.columns["lhs"].db_column, "lhs_id");
    assert_eq!(junction.columns["rhs"].db_column, "rhs_id");
    assert_eq!(
        junction.indexes,
        vec![String::from("lhs_id"), String::from("rhs_id")]
    );
}

#[test]
fn self_schema_indexes_every_relation_column() {
    let registry = node_registry();
    let spec = registry.table_spec("node").unwrap();
    assert_eq!(spec.indexes, vec![String::from("parent_id")]);
    assert!(spec.columns["parent"].nullable);
}
