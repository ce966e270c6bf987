//! Soft-delete scoping.
//!
//! Tables with a soft-delete column keep "deleted" rows with the column set.
//! [`SoftDelete`] adds the matching predicate after the user's own conditions.

use crate::qb::expr::WhereClause;
use crate::qb::param::ParamList;

/// Which rows a soft-deleting query sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeleteScope {
    /// Live rows only (`col IS NULL`).
    #[default]
    Exclude,
    /// Live and trashed rows (no predicate).
    Include,
    /// Trashed rows only (`col IS NOT NULL`).
    Only,
}

/// A soft-delete column with its active scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDelete {
    pub column: String,
    pub scope: SoftDeleteScope,
}

impl SoftDelete {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            scope: SoftDeleteScope::Exclude,
        }
    }

    pub fn with_scope(mut self, scope: SoftDeleteScope) -> Self {
        self.scope = scope;
        self
    }

    fn predicate(&self) -> Option<String> {
        match self.scope {
            SoftDeleteScope::Exclude => Some(format!("{} IS NULL", self.column)),
            SoftDeleteScope::Include => None,
            SoftDeleteScope::Only => Some(format!("{} IS NOT NULL", self.column)),
        }
    }
}

/// Render the WHERE body for `clause` under an optional soft-delete scope.
///
/// Returns an empty string when there is nothing to filter. User conditions
/// containing OR are parenthesized before the scope predicate is ANDed on.
pub(crate) fn render_where(
    clause: &WhereClause,
    soft_delete: Option<&SoftDelete>,
    params: &mut ParamList,
) -> String {
    let user = clause.build_into(params);
    scope_where(clause, user, soft_delete)
}

/// Combine already-rendered user conditions of `clause` with the scope predicate.
pub(crate) fn scope_where(
    clause: &WhereClause,
    user: String,
    soft_delete: Option<&SoftDelete>,
) -> String {
    let scope = soft_delete.and_then(SoftDelete::predicate);

    match scope {
        None => user,
        Some(scope) if user.is_empty() => scope,
        Some(scope) if clause.has_or() => format!("({user}) AND {scope}"),
        Some(scope) => format!("{user} AND {scope}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Logic;
    use crate::qb::expr::Expr;

    fn render(clause: &WhereClause, soft: Option<&SoftDelete>) -> String {
        let mut params = ParamList::new();
        render_where(clause, soft, &mut params)
    }

    #[test]
    fn scope_alone() {
        let clause = WhereClause::new();
        let soft = SoftDelete::new("deleted_at");
        assert_eq!(render(&clause, Some(&soft)), "deleted_at IS NULL");
        let only = soft.clone().with_scope(SoftDeleteScope::Only);
        assert_eq!(render(&clause, Some(&only)), "deleted_at IS NOT NULL");
        let all = soft.with_scope(SoftDeleteScope::Include);
        assert_eq!(render(&clause, Some(&all)), "");
    }

    #[test]
    fn and_conditions_are_not_wrapped() {
        let mut clause = WhereClause::new();
        clause.push(Logic::And, Expr::eq("a", 1_i64));
        clause.push(Logic::And, Expr::eq("b", 2_i64));
        let soft = SoftDelete::new("deleted_at");
        assert_eq!(
            render(&clause, Some(&soft)),
            "a = $1 AND b = $2 AND deleted_at IS NULL"
        );
    }

    #[test]
    fn or_conditions_are_wrapped() {
        let mut clause = WhereClause::new();
        clause.push(Logic::Or, Expr::eq("a", 1_i64));
        clause.push(Logic::Or, Expr::eq("b", 2_i64));
        let soft = SoftDelete::new("deleted_at");
        assert_eq!(
            render(&clause, Some(&soft)),
            "(a = $1 OR b = $2) AND deleted_at IS NULL"
        );
    }

    #[test]
    fn single_or_predicate_needs_no_parens() {
        let mut clause = WhereClause::new();
        clause.push(Logic::Or, Expr::eq("tag_id", 10_i64));
        let soft = SoftDelete::new("deleted_at");
        assert_eq!(
            render(&clause, Some(&soft)),
            "tag_id = $1 AND deleted_at IS NULL"
        );
    }

    #[test]
    fn no_scope_passes_user_conditions_through() {
        let mut clause = WhereClause::new();
        clause.push(Logic::Or, Expr::eq("a", 1_i64));
        clause.push(Logic::Or, Expr::eq("b", 2_i64));
        assert_eq!(render(&clause, None), "a = $1 OR b = $2");
    }
}
