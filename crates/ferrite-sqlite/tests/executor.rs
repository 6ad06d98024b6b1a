//! End-to-end execution against in-memory SQLite.

use ferrite_orm::{
    execute_batch, Arg, EntityDecl, FieldDef, ForeignKeyDef, OnDelete, Registry, SqlStatement,
    SqlValue, StatementExecutor,
};
use ferrite_sqlite::SqliteExecutor;
use sqlx::sqlite::SqlitePoolOptions;

fn raw(sql: &str) -> SqlStatement {
    SqlStatement::new(sql, Vec::new())
}

async fn executor() -> SqliteExecutor {
    // A single connection keeps the in-memory database alive and
    // shared across statements.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqliteExecutor::new(pool)
}

fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .declare(EntityDecl::new("user").field("name", FieldDef::string()))
        .unwrap();
    registry
        .declare(
            EntityDecl::new("blog")
                .field("title", FieldDef::string())
                .field("author", FieldDef::foreign_key("user")),
        )
        .unwrap();
    registry
        .declare(
            EntityDecl::new("entry")
                .field("title", FieldDef::string())
                .field("blog", FieldDef::foreign_key("blog")),
        )
        .unwrap();
    registry
        .declare(
            EntityDecl::new("comment")
                .field("body", FieldDef::text())
                .field(
                    "entry",
                    FieldDef::from(ForeignKeyDef::new("entry").on_delete(OnDelete::SetNull))
                        .nullable(),
                ),
        )
        .unwrap();
    registry
}

async fn create_schema(exec: &SqliteExecutor) {
    for sql in [
        "CREATE TABLE user (user_id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE blog (blog_id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER)",
        "CREATE TABLE entry (entry_id INTEGER PRIMARY KEY, title TEXT, blog_id INTEGER)",
        "CREATE TABLE comment (comment_id INTEGER PRIMARY KEY, body TEXT, entry_id INTEGER)",
    ] {
        exec.execute(&raw(sql)).await.unwrap();
    }
}

#[tokio::test]
async fn insert_then_filtered_select_roundtrip() {
    let exec = executor().await;
    create_schema(&exec).await;
    let registry = registry();

    exec.execute(
        &registry
            .query("user")
            .unwrap()
            .insert(vec![("name", Arg::from("Andy"))])
            .unwrap(),
    )
    .await
    .unwrap();
    let author_id = exec.last_insert_id().await.unwrap();

    exec.execute(
        &registry
            .query("blog")
            .unwrap()
            .insert(vec![("title", Arg::from("First")), ("author", Arg::from(author_id))])
            .unwrap(),
    )
    .await
    .unwrap();

    let rows = exec
        .query(
            &registry
                .query("blog")
                .unwrap()
                .filter("author__name", "=", "Andy")
                .unwrap()
                .select()
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], SqlValue::Text(String::from("First")));
    assert_eq!(rows[0]["author_id"], SqlValue::Int(author_id));
}

#[tokio::test]
async fn joined_update_affects_only_matching_rows() {
    let exec = executor().await;
    create_schema(&exec).await;
    let registry = registry();

    exec.execute(&raw("INSERT INTO user (name) VALUES ('Andy'), ('Beth')"))
        .await
        .unwrap();
    exec.execute(&raw(
        "INSERT INTO blog (title, author_id) VALUES ('A', 1), ('B', 2)",
    ))
    .await
    .unwrap();

    let affected = exec
        .execute(
            &registry
                .query("blog")
                .unwrap()
                .filter("author__name", "=", "Andy")
                .unwrap()
                .update(vec![("title", Arg::from("renamed"))])
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let rows = exec
        .query(&raw("SELECT title FROM blog ORDER BY blog_id"))
        .await
        .unwrap();
    assert_eq!(rows[0]["title"], SqlValue::Text(String::from("renamed")));
    assert_eq!(rows[1]["title"], SqlValue::Text(String::from("B")));
}

#[tokio::test]
async fn cascade_batch_deletes_children_and_nulls_grandchildren() {
    let exec = executor().await;
    create_schema(&exec).await;
    let registry = registry();

    exec.execute(&raw("INSERT INTO user (name) VALUES ('Andy')"))
        .await
        .unwrap();
    exec.execute(&raw("INSERT INTO blog (title, author_id) VALUES ('Old', 1), ('Keep', 1)"))
        .await
        .unwrap();
    exec.execute(&raw(
        "INSERT INTO entry (title, blog_id) VALUES ('e1', 1), ('e2', 1), ('e3', 2)",
    ))
    .await
    .unwrap();
    exec.execute(&raw(
        "INSERT INTO comment (body, entry_id) VALUES ('c1', 1), ('c2', 3)",
    ))
    .await
    .unwrap();

    let plan = registry
        .query("blog")
        .unwrap()
        .filter("title", "=", "Old")
        .unwrap()
        .delete()
        .unwrap();
    execute_batch(&exec, &plan).await.unwrap();

    let blogs = exec.query(&raw("SELECT title FROM blog")).await.unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0]["title"], SqlValue::Text(String::from("Keep")));

    let entries = exec.query(&raw("SELECT title FROM entry")).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], SqlValue::Text(String::from("e3")));

    // The comment on the deleted entry was nulled, not deleted.
    let comments = exec
        .query(&raw("SELECT body, entry_id FROM comment ORDER BY comment_id"))
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["entry_id"], SqlValue::Null);
    assert_eq!(comments[1]["entry_id"], SqlValue::Int(3));
}

#[tokio::test]
async fn failed_batch_rolls_back_everything() {
    let exec = executor().await;
    create_schema(&exec).await;

    exec.execute(&raw("INSERT INTO user (name) VALUES ('Andy')"))
        .await
        .unwrap();

    let statements = vec![
        raw("DELETE FROM user"),
        raw("DELETE FROM missing_table"),
    ];
    assert!(execute_batch(&exec, &statements).await.is_err());

    let rows = exec.query(&raw("SELECT * FROM user")).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn execution_error_carries_the_failing_sql() {
    let exec = executor().await;
    let err = exec
        .execute(&raw("DELETE FROM missing_table"))
        .await
        .unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("missing_table"), "got: {rendered}");
}
