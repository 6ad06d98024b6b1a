//! Cascade-delete planning, asserted against the full ordered batch.

mod common;

use common::{blog_registry, node_registry};
use ferrite_orm::SqlValue;

#[test]
fn cascade_orders_grandchild_updates_before_child_deletes() {
    let statements = blog_registry()
        .query("blog")
        .unwrap()
        .filter("title", "=", "Old")
        .unwrap()
        .delete()
        .unwrap();

    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            // Junction rows first, regardless of policy.
            "DELETE FROM blog_tag WHERE lhs_id IN \
             (SELECT t1.blog_id FROM blog AS t1 WHERE t1.title = ?)",
            // The set_null grandchild is nulled before its parent rows go.
            "UPDATE comment SET entry_id = ? WHERE entry_id IN \
             (SELECT t1.entry_id FROM entry AS t1 WHERE t1.blog_id IN \
             (SELECT t1.blog_id FROM blog AS t1 WHERE t1.title = ?))",
            // Cascade child deletes next.
            "DELETE FROM entry WHERE blog_id IN \
             (SELECT t1.blog_id FROM blog AS t1 WHERE t1.title = ?)",
            // The filtered parent delete is always last.
            "DELETE FROM blog WHERE title = ?",
        ]
    );

    // The nulling UPDATE binds NULL, then the restriction parameters.
    assert_eq!(
        statements[1].params,
        vec![SqlValue::Null, SqlValue::Text(String::from("Old"))]
    );
    assert_eq!(
        statements[3].params,
        vec![SqlValue::Text(String::from("Old"))]
    );
}

#[test]
fn junction_rows_are_deleted_from_either_side() {
    let statements = blog_registry()
        .query("tag")
        .unwrap()
        .filter("tag", "=", "Red")
        .unwrap()
        .delete()
        .unwrap();

    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "DELETE FROM blog_tag WHERE rhs_id IN \
             (SELECT t1.tag_id FROM tag AS t1 WHERE t1.tag = ?)",
            "DELETE FROM tag WHERE tag = ?",
        ]
    );
}

#[test]
fn unfiltered_delete_still_clears_dependents() {
    let statements = blog_registry().query("tag").unwrap().delete().unwrap();
    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "DELETE FROM blog_tag WHERE rhs_id IN (SELECT t1.tag_id FROM tag AS t1)",
            "DELETE FROM tag",
        ]
    );
}

#[test]
fn entity_without_dependents_plans_a_single_delete() {
    let statements = blog_registry()
        .query("comment")
        .unwrap()
        .filter("body", "LIKE", "%spam%")
        .unwrap()
        .delete()
        .unwrap();
    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(sql, vec!["DELETE FROM comment WHERE body LIKE ?"]);
}

#[test]
fn self_referential_cascade_plans_one_nesting_level() {
    let statements = node_registry()
        .query("node")
        .unwrap()
        .filter("label", "=", "root")
        .unwrap()
        .delete()
        .unwrap();
    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();

    let root_sub = "SELECT t1.node_id FROM node AS t1 WHERE t1.label = ?";
    let child_sub =
        format!("SELECT t1.node_id FROM node AS t1 WHERE t1.parent_id IN ({root_sub})");
    assert_eq!(
        sql,
        vec![
            // Junction rows for the roots.
            format!("DELETE FROM node_node WHERE lhs_id IN ({root_sub})"),
            format!("DELETE FROM node_node WHERE rhs_id IN ({root_sub})"),
            // One nested level: junction rows and rows for the children.
            format!("DELETE FROM node_node WHERE lhs_id IN ({child_sub})"),
            format!("DELETE FROM node_node WHERE rhs_id IN ({child_sub})"),
            format!("DELETE FROM node WHERE parent_id IN ({child_sub})"),
            format!("DELETE FROM node WHERE parent_id IN ({root_sub})"),
            String::from("DELETE FROM node WHERE label = ?"),
        ]
    );
}

#[test]
fn joined_filter_delete_restricts_through_a_subquery() {
    let statements = blog_registry()
        .query("comment")
        .unwrap()
        .filter("entry__blog__title", "=", "Old")
        .unwrap()
        .delete()
        .unwrap();
    let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        vec![
            "DELETE FROM comment WHERE comment_id IN \
             (SELECT t1.comment_id FROM comment AS t1 \
             INNER JOIN entry AS t2 ON t1.entry_id = t2.entry_id \
             INNER JOIN blog AS t3 ON t2.blog_id = t3.blog_id WHERE t3.title = ?)",
        ]
    );
}
