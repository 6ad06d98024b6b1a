//! The query specification: a passive, typed description of a single
//! SQL statement.
//!
//! The builder in `ferrite-orm` accumulates one of these per query
//! lineage; a [`Dialect`](crate::dialect::Dialect) renders it to text.
//! Nothing here plans joins or resolves names: the specification is
//! the wire format between builder and compiler and must stay free of
//! behavior so new dialects never touch the builder.

use crate::value::SqlValue;

/// A compiled statement: SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// The SQL text with `?` placeholders.
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

impl SqlStatement {
    /// Creates a statement from SQL text and parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A column reference qualified by a table alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Table alias the column belongs to (e.g. `t1`).
    pub alias: String,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Creates a column reference.
    #[must_use]
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// Renders the reference, alias-qualified or bare.
    ///
    /// Bare rendering is used for UPDATE/DELETE targets, which cannot
    /// reference aliases directly.
    #[must_use]
    pub fn render(&self, qualified: bool) -> String {
        if qualified {
            format!("{}.{}", self.alias, self.column)
        } else {
            self.column.clone()
        }
    }
}

/// The base table of a statement, with its allocated alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub table: String,
    /// Allocated alias (the base table is always `t1`).
    pub alias: String,
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// All columns of an aliased table (`t1.*`).
    Star(String),
    /// A single column, optionally renamed.
    Column {
        /// The referenced column.
        column: ColumnRef,
        /// Optional `AS` name.
        as_name: Option<String>,
    },
}

impl SelectItem {
    fn render(&self) -> String {
        match self {
            Self::Star(alias) => format!("{alias}.*"),
            Self::Column { column, as_name } => match as_name {
                Some(name) => format!("{} AS {name}", column.render(true)),
                None => column.render(true),
            },
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// One JOIN clause of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Join type as emitted.
    pub kind: JoinKind,
    /// Joined table name.
    pub table: String,
    /// Alias allocated for the joined table.
    pub alias: String,
    /// Left side of the ON condition.
    pub left: ColumnRef,
    /// Right side of the ON condition.
    pub right: ColumnRef,
}

impl JoinClause {
    fn render(&self) -> String {
        format!(
            "{} {} AS {} ON {} = {}",
            self.kind.keyword(),
            self.table,
            self.alias,
            self.left.render(true),
            self.right.render(true)
        )
    }
}

/// Comparison operators usable in a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Less than (`<`).
    Lt,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal (`<=`).
    Lte,
    /// Greater than or equal (`>=`).
    Gte,
    /// Pattern match (`LIKE`).
    Like,
}

impl CompareOp {
    /// Returns the SQL operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Like => "LIKE",
        }
    }
}

/// One predicate of the WHERE clause; predicates are AND-conjoined.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op ?`.
    Compare {
        /// Filtered column.
        column: ColumnRef,
        /// Comparison operator.
        op: CompareOp,
        /// Bound value.
        value: SqlValue,
    },
    /// `column IN (?, ?, …)`, one placeholder per element.
    InList {
        /// Filtered column.
        column: ColumnRef,
        /// Bound values.
        values: Vec<SqlValue>,
    },
    /// `column <raw suffix>` (e.g. `IS NOT NULL`).
    Suffix {
        /// Filtered column.
        column: ColumnRef,
        /// Raw SQL appended after the column.
        suffix: String,
    },
    /// `column IN (<subquery>)`, used by cascade plans to restrict
    /// dependent rows to those referencing the deleted set.
    InSubquery {
        /// Filtered column.
        column: ColumnRef,
        /// Rendered subquery text.
        subquery: String,
        /// Parameters bound inside the subquery.
        params: Vec<SqlValue>,
    },
    /// A raw templated clause with its own parameters.
    Raw {
        /// Raw SQL fragment.
        sql: String,
        /// Parameters bound by the fragment.
        params: Vec<SqlValue>,
    },
}

impl Predicate {
    /// Renders the predicate, appending its parameters to `params`.
    pub fn render(&self, qualified: bool, params: &mut Vec<SqlValue>) -> String {
        match self {
            Self::Compare { column, op, value } => {
                params.push(value.clone());
                format!("{} {} ?", column.render(qualified), op.symbol())
            }
            Self::InList { column, values } => {
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                params.extend(values.iter().cloned());
                format!(
                    "{} IN ({})",
                    column.render(qualified),
                    placeholders.join(", ")
                )
            }
            Self::Suffix { column, suffix } => {
                format!("{} {suffix}", column.render(qualified))
            }
            Self::InSubquery {
                column,
                subquery,
                params: own,
            } => {
                params.extend(own.iter().cloned());
                format!("{} IN ({subquery})", column.render(qualified))
            }
            Self::Raw { sql, params: own } => {
                params.extend(own.iter().cloned());
                sql.clone()
            }
        }
    }
}

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Sorted column.
    pub column: ColumnRef,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderTerm {
    fn render(&self) -> String {
        format!("{} {}", self.column.render(true), self.direction.keyword())
    }
}

/// The accumulated specification of a SELECT statement.
///
/// Also used as the row restriction of UPDATE/DELETE specs: the
/// compiler reads `from`, `joins` and `predicates` and rewrites them
/// into a `pk IN (SELECT …)` subquery when joins are present.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSpec {
    /// Whether to emit DISTINCT.
    pub distinct: bool,
    /// SELECT list in append order.
    pub items: Vec<SelectItem>,
    /// Base table with alias.
    pub from: TableRef,
    /// JOIN clauses in append order.
    pub joins: Vec<JoinClause>,
    /// AND-conjoined predicates.
    pub predicates: Vec<Predicate>,
    /// GROUP BY columns.
    pub group_by: Vec<ColumnRef>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderTerm>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
}

impl SelectSpec {
    /// Creates an empty specification over a base table.
    #[must_use]
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            distinct: false,
            items: Vec::new(),
            from: TableRef {
                table: table.into(),
                alias: alias.into(),
            },
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Renders the SELECT list (defaults to `<base>.*` when empty).
    #[must_use]
    pub fn render_items(&self) -> String {
        if self.items.is_empty() {
            return format!("{}.*", self.from.alias);
        }
        let rendered: Vec<String> = self.items.iter().map(SelectItem::render).collect();
        rendered.join(", ")
    }

    /// Renders the FROM clause and all joins.
    #[must_use]
    pub fn render_from(&self) -> String {
        let mut sql = format!("{} AS {}", self.from.table, self.from.alias);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render());
        }
        sql
    }

    /// Renders the WHERE clause body, appending parameters.
    ///
    /// Returns `None` when there are no predicates.
    pub fn render_where(&self, qualified: bool, params: &mut Vec<SqlValue>) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .predicates
            .iter()
            .map(|p| p.render(qualified, params))
            .collect();
        Some(parts.join(" AND "))
    }

    /// Renders the ORDER BY body, if any terms are present.
    #[must_use]
    pub fn render_order(&self) -> Option<String> {
        if self.order_by.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.order_by.iter().map(OrderTerm::render).collect();
        Some(parts.join(", "))
    }

    /// Renders the GROUP BY body, if any columns are present.
    #[must_use]
    pub fn render_group(&self) -> Option<String> {
        if self.group_by.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.group_by.iter().map(|c| c.render(true)).collect();
        Some(parts.join(", "))
    }
}

/// The specification of an INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpec {
    /// Target table.
    pub table: String,
    /// Column names in value order.
    pub columns: Vec<String>,
    /// One value per column.
    pub values: Vec<SqlValue>,
}

/// The specification of an UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    /// Target table.
    pub table: String,
    /// Primary key column, used for the subquery rewrite.
    pub pk_column: String,
    /// `SET` assignments in order.
    pub assignments: Vec<(String, SqlValue)>,
    /// The affected row set (joins and predicates).
    pub rows: SelectSpec,
}

/// The specification of a DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSpec {
    /// Target table.
    pub table: String,
    /// Primary key column, used for the subquery rewrite.
    pub pk_column: String,
    /// The affected row set (joins and predicates).
    pub rows: SelectSpec,
}
