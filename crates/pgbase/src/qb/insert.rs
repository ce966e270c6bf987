//! INSERT query builder.

use crate::error::{OrmError, OrmResult};
use crate::qb::SetValue;
use crate::qb::param::{Param, ParamList};
use crate::qb::traits::{MutationQb, SqlQb};
use crate::record::Record;
use tokio_postgres::types::ToSql;

/// INSERT query builder for a single row.
#[derive(Clone, Debug)]
pub struct InsertQb {
    /// Table name
    table: String,
    /// Column/value pairs in insertion order
    values: Vec<(String, SetValue)>,
    /// RETURNING columns
    returning_cols: Vec<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: Vec::new(),
            returning_cols: Vec::new(),
        }
    }

    /// Set a column value.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.values
            .push((column.to_string(), SetValue::Param(Param::new(value))));
        self
    }

    /// Set a column to a raw SQL expression (e.g. `now()`).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.values
            .push((column.to_string(), SetValue::Raw(expr.to_string())));
        self
    }

    /// Set every column of `record`, in record order.
    pub fn set_record(self, record: &Record) -> Self {
        record
            .iter()
            .fold(self, |qb, (column, value)| qb.set(column, value.clone()))
    }

    /// Set RETURNING columns.
    pub fn returning(mut self, cols: &str) -> Self {
        self.returning_cols = vec![cols.to_string()];
        self
    }

    /// Number of columns set so far.
    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let columns: Vec<&str> = self.values.iter().map(|(c, _)| c.as_str()).collect();
        let exprs: Vec<String> = self
            .values
            .iter()
            .map(|(_, v)| v.render(&mut params))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            exprs.join(", ")
        );

        if !self.returning_cols.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning_cols.join(", "));
        }

        (sql, params)
    }

    fn validate(&self) -> OrmResult<()> {
        if self.values.is_empty() {
            return Err(OrmError::validation("INSERT requires at least one column"));
        }
        Ok(())
    }
}

impl MutationQb for InsertQb {}
