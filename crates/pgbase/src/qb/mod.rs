//! Query builders.
//!
//! Builders are plain values moved through a chain of calls. WHERE predicates
//! come from [`WhereTarget`](crate::WhereTarget), either one at a time or from a
//! whole [`WhereMap`](crate::WhereMap). Placeholders are numbered at build time.
//!
//! # Usage
//!
//! ```ignore
//! use pgbase::{qb, CmpOp, MutationQb, SqlQb, WhereTarget};
//!
//! // SELECT
//! let rows = qb::select("posts")
//!     .soft_delete("deleted_at")
//!     .where_cmp("category_id", CmpOp::Eq, 3_i64)
//!     .order_by("id DESC")
//!     .limit(20)
//!     .query(&client)
//!     .await?;
//!
//! // UPDATE
//! qb::update("posts")
//!     .set("title", "hello")
//!     .where_in("id", vec![1_i64, 2])
//!     .execute(&client)
//!     .await?;
//! ```

mod delete;
pub mod expr;
mod insert;
pub mod param;
mod scope;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use expr::{CmpOp, Expr, WhereClause};
pub use insert::InsertQb;
pub use param::{Param, ParamList};
pub use scope::{SoftDelete, SoftDeleteScope};
pub use select::SelectQb;
pub use traits::{MutationQb, SqlQb};
pub use update::UpdateQb;

/// Right-hand side of an INSERT value or UPDATE assignment.
#[derive(Clone, Debug)]
pub(crate) enum SetValue {
    /// Bound parameter
    Param(Param),
    /// Raw SQL expression
    Raw(String),
}

impl SetValue {
    pub(crate) fn render(&self, params: &mut ParamList) -> String {
        match self {
            SetValue::Param(p) => format!("${}", params.push_param(p.clone())),
            SetValue::Raw(expr) => expr.clone(),
        }
    }
}

/// Create a SELECT query builder for the given table.
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// # Safety
/// By default, DELETE without WHERE conditions will generate `WHERE 1=0` (no-op).
/// Use `allow_delete_all(true)` to allow deleting all rows.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::WhereTarget;
    use crate::condition::WhereMap;

    #[test]
    fn same_map_on_every_builder() {
        let map = WhereMap::new().in_list("id", [1, 2]).ne("category_id", 9);

        assert_eq!(
            select("posts").where_map(&map).to_sql(),
            "SELECT * FROM posts WHERE id IN ($1, $2) AND category_id <> $3"
        );
        assert_eq!(
            update("posts").set("views", 0_i64).where_map(&map).to_sql(),
            "UPDATE posts SET views = $1 WHERE id IN ($2, $3) AND category_id <> $4"
        );
        assert_eq!(
            delete("posts").where_map(&map).to_sql(),
            "DELETE FROM posts WHERE id IN ($1, $2) AND category_id <> $3"
        );
    }

    #[test]
    fn set_value_rendering() {
        let mut params = ParamList::new();
        assert_eq!(SetValue::Param(Param::new(1_i64)).render(&mut params), "$1");
        assert_eq!(SetValue::Raw("now()".into()).render(&mut params), "now()");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn insert_helper() {
        assert_eq!(
            insert("tags").set("name", "rust").returning("id").to_sql(),
            "INSERT INTO tags (name) VALUES ($1) RETURNING id"
        );
    }
}
