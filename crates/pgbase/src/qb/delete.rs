//! DELETE query builder.

use crate::compile::WhereTarget;
use crate::condition::Logic;
use crate::qb::expr::{Expr, WhereClause};
use crate::qb::param::ParamList;
use crate::qb::traits::{MutationQb, SqlQb};

/// DELETE query builder.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    /// Table name
    table: String,
    /// WHERE conditions
    where_clause: WhereClause,
    /// RETURNING columns
    returning_cols: Vec<String>,
    /// Whether to allow DELETE without WHERE (dangerous!)
    allow_delete_all: bool,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_clause: WhereClause::new(),
            returning_cols: Vec::new(),
            allow_delete_all: false,
        }
    }

    /// Allow DELETE without WHERE conditions (dangerous!).
    ///
    /// By default, DELETE without WHERE generates `WHERE 1=0` (no-op).
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }

    /// Set RETURNING columns.
    pub fn returning(mut self, cols: &str) -> Self {
        self.returning_cols = vec![cols.to_string()];
        self
    }
}

impl WhereTarget for DeleteQb {
    fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::And, expr);
        self
    }

    fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::Or, expr);
        self
    }
}

impl SqlQb for DeleteQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut sql = format!("DELETE FROM {}", self.table);

        let where_sql = self.where_clause.build_into(&mut params);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        } else if !self.allow_delete_all {
            sql.push_str(" WHERE 1=0");
        }

        if !self.returning_cols.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning_cols.join(", "));
        }

        (sql, params)
    }
}

impl MutationQb for DeleteQb {}
