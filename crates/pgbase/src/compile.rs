//! Where-map compiler.
//!
//! [`compile`] turns a [`WhereMap`] into predicates on any builder implementing
//! [`WhereTarget`]. The map's [`Logic`] picks the joiner once (`where_*` or
//! `or_where_*`) and every condition is applied through it in map order.
//!
//! ```ignore
//! use pgbase::{qb, WhereMap, WhereTarget};
//!
//! let map = WhereMap::new().in_list("id", [1, 2, 3]).ne("category_id", 9);
//! let q = qb::select("posts").where_map(&map);
//! assert_eq!(q.to_sql(), "SELECT * FROM posts WHERE id IN ($1, $2, $3) AND category_id <> $4");
//! ```

use crate::condition::{Logic, Op, WhereMap};
use crate::qb::expr::{CmpOp, Expr};
use tokio_postgres::types::ToSql;
use tracing::trace;

/// A builder that accepts WHERE predicates.
///
/// Implementors only provide [`and_where`](WhereTarget::and_where) and
/// [`or_where`](WhereTarget::or_where). The `where_*` / `or_where_*` families
/// are shorthands for those two with the matching [`Expr`].
///
/// Builders are moved through the chain, so there is no shared mutable query state.
pub trait WhereTarget: Sized {
    /// Append a predicate joined with AND.
    fn and_where(self, expr: Expr) -> Self;

    /// Append a predicate joined with OR.
    fn or_where(self, expr: Expr) -> Self;

    /// Apply every condition of `map` (see [`compile`]).
    fn where_map(self, map: &WhereMap) -> Self {
        compile(self, map)
    }

    fn where_cmp<T: ToSql + Send + Sync + 'static>(self, column: &str, op: CmpOp, value: T) -> Self {
        self.and_where(Expr::cmp(column, op, value))
    }

    fn or_where_cmp<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        op: CmpOp,
        value: T,
    ) -> Self {
        self.or_where(Expr::cmp(column, op, value))
    }

    fn where_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.and_where(Expr::in_list(column, values))
    }

    fn or_where_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.or_where(Expr::in_list(column, values))
    }

    fn where_not_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.and_where(Expr::not_in(column, values))
    }

    fn or_where_not_in<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        values: Vec<T>,
    ) -> Self {
        self.or_where(Expr::not_in(column, values))
    }

    fn where_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.and_where(Expr::between(column, from, to))
    }

    fn or_where_between<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        from: T,
        to: T,
    ) -> Self {
        self.or_where(Expr::between(column, from, to))
    }

    fn where_not_between<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        from: T,
        to: T,
    ) -> Self {
        self.and_where(Expr::not_between(column, from, to))
    }

    fn or_where_not_between<T: ToSql + Send + Sync + 'static>(
        self,
        column: &str,
        from: T,
        to: T,
    ) -> Self {
        self.or_where(Expr::not_between(column, from, to))
    }

    fn where_null(self, column: &str) -> Self {
        self.and_where(Expr::is_null(column))
    }

    fn or_where_null(self, column: &str) -> Self {
        self.or_where(Expr::is_null(column))
    }

    fn where_not_null(self, column: &str) -> Self {
        self.and_where(Expr::is_not_null(column))
    }

    fn or_where_not_null(self, column: &str) -> Self {
        self.or_where(Expr::is_not_null(column))
    }
}

impl WhereTarget for crate::qb::WhereClause {
    fn and_where(mut self, expr: Expr) -> Self {
        self.push(Logic::And, expr);
        self
    }

    fn or_where(mut self, expr: Expr) -> Self {
        self.push(Logic::Or, expr);
        self
    }
}

/// Apply the conditions of `map` to `builder`.
///
/// An empty map returns the builder untouched: on read paths no conditions means
/// no filter. Mutating callers reject empty maps before getting here (see
/// [`WhereMap::require_non_empty`]).
pub fn compile<B: WhereTarget>(builder: B, map: &WhereMap) -> B {
    if map.is_empty() {
        return builder;
    }

    let join: fn(B, Expr) -> B = match map.logic() {
        Logic::And => B::and_where,
        Logic::Or => B::or_where,
    };

    trace!(
        target: "pgbase.compile",
        logic = %map.logic(),
        predicates = map.len(),
        "compiling where-map"
    );

    map.iter()
        .fold(builder, |builder, (field, op)| join(builder, predicate(field, op)))
}

/// The predicate for one where-map condition.
pub fn predicate(field: &str, op: &Op) -> Expr {
    match op {
        Op::Eq(v) => Expr::cmp(field, CmpOp::Eq, v.clone()),
        Op::Gt(v) => Expr::cmp(field, CmpOp::Gt, v.clone()),
        Op::Lt(v) => Expr::cmp(field, CmpOp::Lt, v.clone()),
        Op::Ne(v) => Expr::cmp(field, CmpOp::Ne, v.clone()),
        Op::Like(v) => Expr::cmp(field, CmpOp::Like, v.clone()),
        Op::In(values) => Expr::in_list(field, values.clone()),
        Op::NotIn(values) => Expr::not_in(field, values.clone()),
        Op::Between(from, to) => Expr::between(field, from.clone(), to.clone()),
        Op::NotBetween(from, to) => Expr::not_between(field, from.clone(), to.clone()),
        Op::IsNull => Expr::is_null(field),
        Op::IsNotNull => Expr::is_not_null(field),
    }
}
