//! Expression layer for WHERE clauses.
//!
//! [`Expr`] is one predicate; [`WhereClause`] is an ordered list of predicates,
//! each tagged with the [`Logic`] that joins it to the previous one. Placeholders
//! (`$1`, `$2`, ...) are numbered at build time as parameters are pushed, so
//! fragments never need string rewriting.

use crate::condition::Logic;
use crate::qb::param::{Param, ParamList};
use tokio_postgres::types::ToSql;

/// Comparison operator with an explicit SQL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
}

impl CmpOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Like => "LIKE",
            CmpOp::Ilike => "ILIKE",
        }
    }
}

/// A single predicate.
#[derive(Clone, Debug)]
pub enum Expr {
    /// column op $n
    Compare {
        column: String,
        op: CmpOp,
        value: Param,
    },
    /// column [NOT] IN ($n, ...)
    InList {
        column: String,
        values: Vec<Param>,
        negated: bool,
    },
    /// column [NOT] BETWEEN $n AND $m
    Between {
        column: String,
        from: Param,
        to: Param,
        negated: bool,
    },
    /// column IS [NOT] NULL
    NullCheck { column: String, negated: bool },
    /// Parenthesized sub-clause.
    Group(WhereClause),
    /// Raw SQL fragment without parameters.
    Raw(String),
}

impl Expr {
    pub fn cmp<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        op: CmpOp,
        value: T,
    ) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: Param::new(value),
        }
    }

    pub fn eq<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::cmp(column, CmpOp::Eq, value)
    }

    pub fn in_list<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: false,
        }
    }

    pub fn not_in<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: true,
        }
    }

    pub fn between<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        from: T,
        to: T,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated: false,
        }
    }

    pub fn not_between<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        from: T,
        to: T,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated: true,
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            negated: true,
        }
    }

    pub fn group(clause: WhereClause) -> Self {
        Expr::Group(clause)
    }

    /// Raw SQL fragment. The caller is responsible for its safety.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Render this predicate, pushing its parameters.
    ///
    /// An empty group renders as an empty string and is skipped by the caller.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Expr::Compare { column, op, value } => {
                let idx = params.push_param(value.clone());
                format!("{} {} ${}", column, op.as_sql(), idx)
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    let always = if *negated { "1=1" } else { "1=0" };
                    return always.to_string();
                }
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| format!("${}", params.push_param(v.clone())))
                    .collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, op, placeholders.join(", "))
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let p1 = params.push_param(from.clone());
                let p2 = params.push_param(to.clone());
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{column} {op} ${p1} AND ${p2}")
            }
            Expr::NullCheck { column, negated } => {
                if *negated {
                    format!("{column} IS NOT NULL")
                } else {
                    format!("{column} IS NULL")
                }
            }
            Expr::Group(clause) => {
                let inner = clause.build_into(params);
                if inner.is_empty() {
                    inner
                } else {
                    format!("({inner})")
                }
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }
}

/// Ordered predicates joined left to right by their own [`Logic`].
///
/// The logic of the first entry is ignored, so `a`, `OR b`, `AND c` renders as
/// `a OR b AND c` (with SQL precedence: `a OR (b AND c)`). Use [`Expr::Group`]
/// to force a different grouping.
#[derive(Clone, Debug, Default)]
pub struct WhereClause {
    entries: Vec<(Logic, Expr)>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, logic: Logic, expr: Expr) {
        self.entries.push((logic, expr));
    }

    pub fn entries(&self) -> &[(Logic, Expr)] {
        &self.entries
    }

    /// Whether any predicate after the first is OR-joined.
    ///
    /// Such a clause must be parenthesized before another predicate is ANDed to it.
    pub fn has_or(&self) -> bool {
        self.entries.iter().skip(1).any(|(logic, _)| *logic == Logic::Or)
    }

    /// Render the clause (without the `WHERE` keyword) into an existing parameter list.
    pub fn build_into(&self, params: &mut ParamList) -> String {
        let mut sql = String::new();
        for (logic, expr) in &self.entries {
            let part = expr.build(params);
            if part.is_empty() {
                continue;
            }
            if !sql.is_empty() {
                sql.push_str(logic.connector());
            }
            sql.push_str(&part);
        }
        sql
    }

    /// Render the clause with its own parameter list starting at `$1`.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = self.build_into(&mut params);
        (sql, params)
    }
}
