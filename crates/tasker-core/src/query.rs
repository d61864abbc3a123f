//! Query builder over a single table
//!
//! A `Query` is an immutable descriptor: every builder method consumes the
//! query and returns a new one, so a descriptor can be cloned and extended
//! without affecting the original.
//!
//! Execution order is fixed: select all rows, filter (order preserved),
//! sort (stable), then cap.
//!
//! ```ignore
//! let top = Query::table(Table::Tasks)
//!     .filter(|r| !r.is_truthy("completed"))
//!     .order_by("createdAt", Direction::Descending)
//!     .limit(5)
//!     .execute(&db)?;
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::database::Database;
use crate::document::{Record, Table};
use crate::error::DbResult;

/// Row predicate
pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query descriptor
#[derive(Clone)]
pub struct Query {
    table: Table,
    predicate: Option<Predicate>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Select every row of `table`
    pub fn table(table: Table) -> Self {
        Self {
            table,
            predicate: None,
            order: None,
            limit: None,
        }
    }

    /// Keep only rows matching `predicate` (replaces any earlier filter)
    #[must_use]
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
            ..self
        }
    }

    /// Sort by `field`
    #[must_use]
    pub fn order_by(self, field: impl Into<String>, direction: Direction) -> Self {
        Self {
            order: Some(OrderBy {
                field: field.into(),
                direction,
            }),
            ..self
        }
    }

    /// Sort by `field`, ascending
    #[must_use]
    pub fn order_by_asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::default())
    }

    /// Return at most `count` rows. `limit(0)` returns nothing.
    #[must_use]
    pub fn limit(self, count: usize) -> Self {
        Self {
            limit: Some(count),
            ..self
        }
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn row_cap(&self) -> Option<usize> {
        self.limit
    }

    /// Run the query
    ///
    /// A failure from the underlying select is returned unchanged.
    pub fn execute(&self, db: &Database) -> DbResult<Vec<Record>> {
        let rows = db.select_all(self.table)?;
        Ok(self.apply(rows))
    }

    /// Filter, sort and cap an already-loaded row set
    pub fn apply(&self, rows: Vec<Record>) -> Vec<Record> {
        let mut rows: Vec<Record> = match &self.predicate {
            Some(predicate) => rows.into_iter().filter(|r| predicate(r)).collect(),
            None => rows,
        };

        if let Some(order) = &self.order {
            // `sort_by` is stable: equal keys keep their filtered order
            rows.sort_by(|a, b| {
                let cmp = compare_field_values(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    Direction::Ascending => cmp,
                    Direction::Descending => cmp.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        rows
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("filtered", &self.predicate.is_some())
            .field("order", &self.order)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Compare two sort-field values
///
/// Missing and null values count as the empty string. Numbers compare
/// numerically, strings lexicographically, booleans false before true.
/// Values of different kinds order by kind: booleans, numbers, strings,
/// arrays, objects.
pub fn compare_field_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let empty = Value::String(String::new());
    let a = coerce_missing(a, &empty);
    let b = coerce_missing(b, &empty);

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => kind_rank(x).cmp(&kind_rank(y)),
    }
}

fn coerce_missing<'a>(value: Option<&'a Value>, empty: &'a Value) -> &'a Value {
    match value {
        None | Some(Value::Null) => empty,
        Some(v) => v,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
