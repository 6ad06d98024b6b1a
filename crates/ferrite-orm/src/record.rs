//! Dynamic row values and filter arguments.

use std::collections::BTreeMap;

use ferrite_sql_core::{SqlValue, ToSqlValue};

/// A dynamic row: an entity name plus column values.
///
/// Executors return these for SELECT results, and they are accepted
/// as filter arguments; a relation-typed filter coerces a record to
/// its primary key value transparently.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: String,
    values: BTreeMap<String, SqlValue>,
}

impl Record {
    /// Creates an empty record for the named entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: BTreeMap::new(),
        }
    }

    /// Returns the entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Sets a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        self.values.insert(column.into(), value.to_sql_value());
    }

    /// Sets a column value, chainable.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.set(column, value);
        self
    }

    /// Gets a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// All column values.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, SqlValue> {
        &self.values
    }
}

/// An argument passed to `filter`, `insert` or `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A single bound value.
    Value(SqlValue),
    /// A list of values (required by the `IN` operator).
    List(Vec<SqlValue>),
    /// A loaded row; coerced to its primary key.
    Record(Record),
}

impl From<SqlValue> for Arg {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl From<Record> for Arg {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

macro_rules! impl_arg_from_scalar {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_sql_value())
                }
            }
            impl From<Vec<$ty>> for Arg {
                fn from(values: Vec<$ty>) -> Self {
                    Self::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
                }
            }
        )+
    };
}

impl_arg_from_scalar!(bool, i32, i64, f64, String, &str);

impl From<Vec<SqlValue>> for Arg {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::List(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_set_get() {
        let mut rec = Record::new("user");
        rec.set("user_id", 7_i64);
        rec.set("name", "Andy");
        assert_eq!(rec.get("user_id"), Some(&SqlValue::Int(7)));
        assert_eq!(rec.entity(), "user");
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Arg::from(3_i64), Arg::Value(SqlValue::Int(3)));
        assert_eq!(
            Arg::from(vec![1_i64, 2]),
            Arg::List(vec![SqlValue::Int(1), SqlValue::Int(2)])
        );
        assert!(matches!(Arg::from(Record::new("user")), Arg::Record(_)));
    }
}
