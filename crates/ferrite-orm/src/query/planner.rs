//! Join planning: alias allocation and join reuse.

use std::collections::BTreeMap;

use ferrite_sql_core::{ColumnRef, JoinClause, JoinKind};
use tracing::{debug, warn};

/// The alias of a query's base table.
pub(crate) const BASE_ALIAS: &str = "t1";

/// A single join request from the path resolver.
#[derive(Debug)]
pub(crate) struct JoinRequest<'a> {
    /// Alias the join hangs off.
    pub left_alias: &'a str,
    /// Entity on the left side, part of the reuse key.
    pub left_entity: &'a str,
    /// Column on the left side of the ON condition.
    pub left_column: &'a str,
    /// Entity on the right side, part of the reuse key.
    pub right_entity: &'a str,
    /// Table joined in.
    pub right_table: &'a str,
    /// Column on the right side of the ON condition.
    pub right_column: &'a str,
    /// Requested join type.
    pub kind: JoinKind,
}

/// One query's join list and alias table.
///
/// Cloned wholesale when a builder clones, so sibling lineages never
/// observe each other's aliases.
#[derive(Debug, Clone)]
pub(crate) struct JoinPlanner {
    joins: Vec<JoinClause>,
    aliases: BTreeMap<String, String>,
    seq: usize,
}

impl JoinPlanner {
    pub(crate) fn new() -> Self {
        Self {
            joins: Vec::new(),
            aliases: BTreeMap::new(),
            seq: 1,
        }
    }

    /// Adds a join, reusing an already-planned one when the same
    /// relation was joined from the same spot before.
    ///
    /// The reuse key includes the left alias so chained self-joins
    /// allocate one alias per depth. A reused join keeps its emitted
    /// type: LEFT-then-INNER on the same alias stays LEFT, with a
    /// warning, since retroactive narrowing would change semantics
    /// silently.
    pub(crate) fn add_join(&mut self, req: &JoinRequest<'_>) -> String {
        let key = format!(
            "{}:{}.{}__{}.{}",
            req.left_alias, req.left_entity, req.left_column, req.right_entity, req.right_column
        );
        if let Some(alias) = self.aliases.get(&key) {
            let emitted = self
                .joins
                .iter()
                .find(|j| j.alias == *alias)
                .map(|j| j.kind);
            if emitted.is_some_and(|kind| kind != req.kind) {
                warn!(
                    alias = %alias,
                    requested = req.kind.keyword(),
                    "join already planned with a different type; keeping it"
                );
            }
            return alias.clone();
        }

        self.seq += 1;
        let alias = format!("t{}", self.seq);
        debug!(
            alias = %alias,
            table = req.right_table,
            kind = req.kind.keyword(),
            "planning join"
        );
        self.joins.push(JoinClause {
            kind: req.kind,
            table: req.right_table.to_string(),
            alias: alias.clone(),
            left: ColumnRef::new(req.left_alias, req.left_column),
            right: ColumnRef::new(&alias, req.right_column),
        });
        self.aliases.insert(key, alias.clone());
        alias
    }

    /// The planned joins in emission order.
    pub(crate) fn joins(&self) -> &[JoinClause] {
        &self.joins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_author_request(kind: JoinKind) -> JoinRequest<'static> {
        JoinRequest {
            left_alias: BASE_ALIAS,
            left_entity: "blog",
            left_column: "author_id",
            right_entity: "user",
            right_table: "user",
            right_column: "user_id",
            kind,
        }
    }

    #[test]
    fn test_join_allocates_sequential_aliases() {
        let mut planner = JoinPlanner::new();
        let alias = planner.add_join(&blog_author_request(JoinKind::Inner));
        assert_eq!(alias, "t2");
        assert_eq!(planner.joins().len(), 1);
    }

    #[test]
    fn test_same_request_reuses_alias() {
        let mut planner = JoinPlanner::new();
        let first = planner.add_join(&blog_author_request(JoinKind::Inner));
        let second = planner.add_join(&blog_author_request(JoinKind::Inner));
        assert_eq!(first, second);
        assert_eq!(planner.joins().len(), 1);
    }

    #[test]
    fn test_conflicting_type_keeps_emitted_join() {
        let mut planner = JoinPlanner::new();
        planner.add_join(&blog_author_request(JoinKind::Left));
        planner.add_join(&blog_author_request(JoinKind::Inner));
        assert_eq!(planner.joins().len(), 1);
        assert_eq!(planner.joins()[0].kind, JoinKind::Left);
    }

    #[test]
    fn test_distinct_left_alias_allocates_new_join() {
        let mut planner = JoinPlanner::new();
        let first = planner.add_join(&JoinRequest {
            left_alias: "t1",
            left_entity: "node",
            left_column: "parent_id",
            right_entity: "node",
            right_table: "node",
            right_column: "node_id",
            kind: JoinKind::Inner,
        });
        let second = planner.add_join(&JoinRequest {
            left_alias: &first,
            left_entity: "node",
            left_column: "parent_id",
            right_entity: "node",
            right_table: "node",
            right_column: "node_id",
            kind: JoinKind::Inner,
        });
        assert_ne!(first, second);
        assert_eq!(planner.joins().len(), 2);
    }
}
