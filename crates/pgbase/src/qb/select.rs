//! SELECT query builder.

use crate::client::GenericClient;
use crate::compile::WhereTarget;
use crate::condition::Logic;
use crate::error::OrmResult;
use crate::qb::expr::{Expr, WhereClause};
use crate::qb::param::ParamList;
use crate::qb::scope::{SoftDelete, SoftDeleteScope, render_where};
use crate::qb::traits::SqlQb;

/// SELECT query builder.
#[derive(Clone, Debug)]
pub struct SelectQb {
    /// Table or FROM expression
    from_expr: String,
    /// SELECT columns (default ["*"])
    select_cols: Vec<String>,
    /// WHERE conditions
    where_clause: WhereClause,
    /// Soft-delete column and scope
    soft_delete: Option<SoftDelete>,
    /// ORDER BY clauses
    order_clauses: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table.
    pub fn new(table: &str) -> Self {
        Self {
            from_expr: table.to_string(),
            select_cols: vec!["*".to_string()],
            where_clause: WhereClause::new(),
            soft_delete: None,
            order_clauses: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set SELECT columns (string form, supports complex expressions).
    pub fn select(mut self, cols: &str) -> Self {
        self.select_cols = vec![cols.to_string()];
        self
    }

    /// Set SELECT columns (array form).
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        self.select_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    // ==================== Soft delete ====================

    /// Hide rows whose `column` is set.
    pub fn soft_delete(mut self, column: &str) -> Self {
        self.soft_delete = Some(SoftDelete::new(column));
        self
    }

    /// Change the scope of a configured soft-delete column. No-op without one.
    pub fn scope(mut self, scope: SoftDeleteScope) -> Self {
        if let Some(soft) = self.soft_delete.as_mut() {
            soft.scope = scope;
        }
        self
    }

    /// Include soft-deleted rows.
    pub fn with_trashed(self) -> Self {
        self.scope(SoftDeleteScope::Include)
    }

    /// Only soft-deleted rows.
    pub fn only_trashed(self) -> Self {
        self.scope(SoftDeleteScope::Only)
    }

    // ==================== Ordering & Pagination ====================

    /// Add ORDER BY clause.
    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_clauses.push(clause.to_string());
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.order_clauses.push(format!("{column} ASC"));
        self
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_clauses.push(format!("{column} DESC"));
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1) * size);
        self
    }

    // ==================== Build helpers ====================

    fn build_select_sql(&self, is_count: bool) -> (String, ParamList) {
        let mut params = ParamList::new();

        let select_part = if is_count {
            "COUNT(*)".to_string()
        } else {
            self.select_cols.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", select_part, self.from_expr);

        let where_sql = render_where(&self.where_clause, self.soft_delete.as_ref(), &mut params);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        // ORDER BY, LIMIT, OFFSET (not for COUNT)
        if !is_count {
            if !self.order_clauses.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&self.order_clauses.join(", "));
            }

            if let Some(limit) = self.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }

            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        (sql, params)
    }

    /// Get the COUNT SQL string (for debugging).
    pub fn to_count_sql(&self) -> String {
        self.build_select_sql(true).0
    }

    /// Execute COUNT query.
    pub async fn count(&self, conn: &impl GenericClient) -> OrmResult<i64> {
        let (sql, params) = self.build_select_sql(true);
        let row = conn.query_one(&sql, &params.as_refs()).await?;
        Ok(row.get(0))
    }
}

impl WhereTarget for SelectQb {
    fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::And, expr);
        self
    }

    fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::Or, expr);
        self
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> (String, ParamList) {
        self.build_select_sql(false)
    }
}
