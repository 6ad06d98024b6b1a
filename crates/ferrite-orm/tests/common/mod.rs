//! Shared entity fixtures for the integration suites.
#![allow(dead_code)] // not every suite uses every fixture

use ferrite_orm::{EntityDecl, FieldDef, ForeignKeyDef, ManyToManyDef, OnDelete, Registry};

/// The blogging schema most tests run against:
///
/// - `user { name }`
/// - `profile { age, the_user → user }` (reverse: `profile_set`)
/// - `blog { title, author → user, tags ⇄ tag }` (reverse: `blog_set`)
/// - `entry { title, blog → blog, cascade }` (reverse: `entry_set`)
/// - `comment { body, entry → entry, set_null }` (reverse: `comment_set`)
/// - `tag { tag }`
pub fn blog_registry() -> Registry {
    let registry = Registry::new();
    registry
        .declare(EntityDecl::new("user").field("name", FieldDef::string()))
        .unwrap();
    registry
        .declare(
            EntityDecl::new("profile")
                .field("age", FieldDef::integer())
                .field("the_user", FieldDef::foreign_key("user")),
        )
        .unwrap();
    registry
        .declare(
            EntityDecl::new("blog")
                .field("title", FieldDef::string())
                .field("author", FieldDef::foreign_key("user"))
                .field("tags", FieldDef::many_to_many("tag")),
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
                .field("entry", ForeignKeyDef::new("entry").on_delete(OnDelete::SetNull)),
        )
        .unwrap();
    registry
        .declare(EntityDecl::new("tag").field("tag", FieldDef::string()))
        .unwrap();
    registry
}

/// A self-referential schema: `node { label, parent → node (reverse:
/// children), links ⇄ node (reverse: linked_by) }`.
pub fn node_registry() -> Registry {
    let registry = Registry::new();
    registry
        .declare(
            EntityDecl::new("node")
                .field("label", FieldDef::string())
                .field(
                    "parent",
                    FieldDef::from(ForeignKeyDef::new("node").related_name("children"))
                        .nullable(),
                )
                .field("links", ManyToManyDef::new("node").related_name("linked_by")),
        )
        .unwrap();
    registry
}
