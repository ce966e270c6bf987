//! UPDATE query builder.

use crate::compile::WhereTarget;
use crate::condition::Logic;
use crate::error::{OrmError, OrmResult};
use crate::qb::SetValue;
use crate::qb::expr::{Expr, WhereClause};
use crate::qb::param::{Param, ParamList};
use crate::qb::scope::{SoftDelete, SoftDeleteScope, scope_where};
use crate::qb::traits::{MutationQb, SqlQb};
use crate::record::Record;
use tokio_postgres::types::ToSql;

/// UPDATE query builder.
///
/// Without user WHERE conditions the statement renders `WHERE 1=0` (no-op)
/// unless [`allow_update_all`](UpdateQb::allow_update_all) is set. The
/// soft-delete scope alone does not count as a condition.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    /// Table name
    table: String,
    /// SET column/value pairs
    sets: Vec<(String, SetValue)>,
    /// WHERE conditions
    where_clause: WhereClause,
    /// Soft-delete column and scope
    soft_delete: Option<SoftDelete>,
    /// RETURNING columns
    returning_cols: Vec<String>,
    allow_update_all: bool,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            where_clause: WhereClause::new(),
            soft_delete: None,
            returning_cols: Vec::new(),
            allow_update_all: false,
        }
    }

    /// Allow UPDATE without WHERE conditions.
    pub fn allow_update_all(mut self, allow: bool) -> Self {
        self.allow_update_all = allow;
        self
    }

    /// Set a column value.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.sets
            .push((column.to_string(), SetValue::Param(Param::new(value))));
        self
    }

    /// Set a column to a raw SQL expression (e.g. `now()`, `NULL`).
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.sets
            .push((column.to_string(), SetValue::Raw(expr.to_string())));
        self
    }

    /// Set every column of `record`, in record order.
    pub fn set_record(self, record: &Record) -> Self {
        record
            .iter()
            .fold(self, |qb, (column, value)| qb.set(column, value.clone()))
    }

    /// Restrict to rows visible under `scope` of the soft-delete `column`.
    pub fn soft_delete(mut self, column: &str, scope: SoftDeleteScope) -> Self {
        self.soft_delete = Some(SoftDelete::new(column).with_scope(scope));
        self
    }

    /// Set RETURNING columns.
    pub fn returning(mut self, cols: &str) -> Self {
        self.returning_cols = vec![cols.to_string()];
        self
    }
}

impl WhereTarget for UpdateQb {
    fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::And, expr);
        self
    }

    fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.push(Logic::Or, expr);
        self
    }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();

        // SET placeholders come first.
        let assignments: Vec<String> = self
            .sets
            .iter()
            .map(|(column, value)| format!("{} = {}", column, value.render(&mut params)))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));

        // Empty groups render to nothing, so the guard looks at the rendered text.
        let user = self.where_clause.build_into(&mut params);
        if user.is_empty() && !self.allow_update_all {
            sql.push_str(" WHERE 1=0");
        } else {
            let where_sql = scope_where(&self.where_clause, user, self.soft_delete.as_ref());
            if !where_sql.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&where_sql);
            }
        }

        if !self.returning_cols.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning_cols.join(", "));
        }

        (sql, params)
    }

    fn validate(&self) -> OrmResult<()> {
        if self.sets.is_empty() {
            return Err(OrmError::validation("UPDATE requires at least one SET field"));
        }
        Ok(())
    }
}

impl MutationQb for UpdateQb {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::WhereMap;
    use crate::qb::expr::CmpOp;

    #[test]
    fn test_simple_update() {
        let qb = UpdateQb::new("users")
            .set("status", "inactive")
            .where_cmp("id", CmpOp::Eq, 1i64);
        assert_eq!(qb.to_sql(), "UPDATE users SET status = $1 WHERE id = $2");
    }

    #[test]
    fn test_update_with_raw() {
        let qb = UpdateQb::new("posts")
            .set("title", "x")
            .set_raw("updated_at", "now()")
            .where_in("id", vec![1i64, 2]);
        assert_eq!(
            qb.to_sql(),
            "UPDATE posts SET title = $1, updated_at = now() WHERE id IN ($2, $3)"
        );
    }

    #[test]
    fn test_update_without_where_is_noop() {
        let qb = UpdateQb::new("users").set("status", "x");
        assert_eq!(qb.to_sql(), "UPDATE users SET status = $1 WHERE 1=0");
        let qb = qb.allow_update_all(true);
        assert_eq!(qb.to_sql(), "UPDATE users SET status = $1");
    }

    #[test]
    fn test_update_empty_group_is_noop() {
        let qb = UpdateQb::new("posts")
            .set("title", "x")
            .and_where(Expr::group(WhereClause::new()));
        assert_eq!(qb.to_sql(), "UPDATE posts SET title = $1 WHERE 1=0");

        let qb = UpdateQb::new("posts")
            .set_raw("deleted_at", "now()")
            .soft_delete("deleted_at", SoftDeleteScope::Exclude)
            .and_where(Expr::group(WhereClause::new()));
        assert_eq!(qb.to_sql(), "UPDATE posts SET deleted_at = now() WHERE 1=0");

        let qb = qb.allow_update_all(true);
        assert_eq!(
            qb.to_sql(),
            "UPDATE posts SET deleted_at = now() WHERE deleted_at IS NULL"
        );
    }

    #[test]
    fn test_update_scoped_or_map() {
        let map = WhereMap::or().eq("a", 1).eq("b", 2);
        let qb = UpdateQb::new("posts")
            .set_raw("deleted_at", "now()")
            .soft_delete("deleted_at", SoftDeleteScope::Exclude)
            .where_map(&map);
        assert_eq!(
            qb.to_sql(),
            "UPDATE posts SET deleted_at = now() WHERE (a = $1 OR b = $2) AND deleted_at IS NULL"
        );
    }

    #[test]
    fn test_update_with_returning() {
        let qb = UpdateQb::new("users")
            .set("name", "bob")
            .where_cmp("id", CmpOp::Eq, 7i64)
            .returning("id, name");
        assert_eq!(
            qb.to_sql(),
            "UPDATE users SET name = $1 WHERE id = $2 RETURNING id, name"
        );
    }

    #[test]
    fn test_update_requires_set() {
        let err = UpdateQb::new("users")
            .where_cmp("id", CmpOp::Eq, 1i64)
            .validate()
            .unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }
}
