//! Cross-dialect compilation tests.

use ferrite_sql_core::{
    ColumnRef, CompareOp, Dialect, InsertSpec, MssqlDialect, MysqlDialect, PostgresDialect,
    Predicate, SelectSpec, SqlValue, SqliteDialect, UpdateSpec,
};

fn limited_spec() -> SelectSpec {
    let mut spec = SelectSpec::new("t", "t1");
    spec.limit = Some(3);
    spec
}

#[test]
fn limit_parity_across_dialects() {
    let spec = limited_spec();

    let sqlite = SqliteDialect::new().compile_select(&spec).unwrap();
    assert_eq!(sqlite.sql, "SELECT t1.* FROM t AS t1 LIMIT 3");

    let postgres = PostgresDialect::new().compile_select(&spec).unwrap();
    assert_eq!(postgres.sql, "SELECT t1.* FROM t AS t1 LIMIT 3");

    let mysql = MysqlDialect::new().compile_select(&spec).unwrap();
    assert_eq!(mysql.sql, "SELECT t1.* FROM t AS t1 LIMIT 3");

    let mssql = MssqlDialect::new().compile_select(&spec).unwrap();
    assert_eq!(mssql.sql, "SELECT TOP 3 t1.* FROM t AS t1");
}

#[test]
fn offset_on_top_only_dialect_fails() {
    let mut spec = limited_spec();
    spec.offset = Some(6);

    assert!(SqliteDialect::new().compile_select(&spec).is_ok());
    assert!(MssqlDialect::new().compile_select(&spec).is_err());
}

#[test]
fn distinct_renders_before_top() {
    let mut spec = limited_spec();
    spec.distinct = true;
    let stmt = MssqlDialect::new().compile_select(&spec).unwrap();
    assert_eq!(stmt.sql, "SELECT DISTINCT TOP 3 t1.* FROM t AS t1");
}

#[test]
fn insert_renders_one_placeholder_per_value() {
    let spec = InsertSpec {
        table: String::from("blog"),
        columns: vec![String::from("title"), String::from("author_id")],
        values: vec![SqlValue::Text(String::from("a")), SqlValue::Int(7)],
    };
    let stmt = SqliteDialect::new().compile_insert(&spec).unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO blog (title, author_id) VALUES (?, ?)"
    );
    assert_eq!(stmt.params.len(), 2);
}

#[test]
fn update_param_order_is_assignments_then_predicates() {
    let mut rows = SelectSpec::new("blog", "t1");
    rows.predicates.push(Predicate::Compare {
        column: ColumnRef::new("t1", "blog_id"),
        op: CompareOp::Eq,
        value: SqlValue::Int(9),
    });
    let spec = UpdateSpec {
        table: String::from("blog"),
        pk_column: String::from("blog_id"),
        assignments: vec![(String::from("title"), SqlValue::Text(String::from("new")))],
        rows,
    };
    let stmt = SqliteDialect::new().compile_update(&spec).unwrap();
    assert_eq!(stmt.sql, "UPDATE blog SET title = ? WHERE blog_id = ?");
    assert_eq!(
        stmt.params,
        vec![SqlValue::Text(String::from("new")), SqlValue::Int(9)]
    );
}
