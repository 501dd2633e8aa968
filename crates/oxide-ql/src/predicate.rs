//! Predicate value objects with late binding (§3, §4.13).
//!
//! A `Predicate` is a sequence of `(column, op, value)` clauses combined by
//! AND. It's used wherever a disjunction of multi-clause conditions is
//! needed — the OR-of-predicates operator (§4.4) and join bind predicates
//! (§4.9) — as opposed to the single-clause builder calls (`eq`, `lt`, …)
//! that operators expose directly on [`crate::table::Table`].

use crate::collation::LikePattern;
use crate::error::{EngineError, Result};
use crate::row::Row;
use crate::schema::ColumnName;
use crate::value::Scalar;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,
}

/// A placeholder marker: named (`:name`) or positional (`0`, `1`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Named(String),
    Positional(usize),
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(n) => write!(f, ":{n}"),
            Self::Positional(i) => write!(f, "{i}"),
        }
    }
}

/// The right-hand side of a clause: a literal value, a value list (for
/// `in`), or an unresolved placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Rhs {
    Value(Scalar),
    Values(Vec<Scalar>),
    Placeholder(Placeholder),
}

/// A single `(column, op, value)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: ColumnName,
    pub op: CompareOp,
    pub rhs: Rhs,
}

/// A sequence of AND-combined clauses. Empty (no-clause) predicates match
/// nothing when used as an `or()` argument and everything when trivially
/// AND-combined, per §3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
    /// Names already resolved by a previous `bind()` call, tracked
    /// separately from `clauses` so a second `bind()` that names one of
    /// them again is rejected even though the clause itself no longer
    /// carries a `Placeholder` to inspect.
    bound_names: Vec<String>,
}

impl Predicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[must_use]
    pub fn and(mut self, column: impl Into<ColumnName>, op: CompareOp, rhs: Rhs) -> Self {
        self.clauses.push(Clause {
            column: column.into(),
            op,
            rhs,
        });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<ColumnName>, value: impl Into<Scalar>) -> Self {
        self.and(column, CompareOp::Eq, Rhs::Value(value.into()))
    }

    #[must_use]
    pub fn eq_placeholder(self, column: impl Into<ColumnName>, ph: Placeholder) -> Self {
        self.and(column, CompareOp::Eq, Rhs::Placeholder(ph))
    }

    /// True when every clause's placeholder (if any) has been resolved.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self
            .clauses
            .iter()
            .any(|c| matches!(c.rhs, Rhs::Placeholder(_)))
    }

    fn unbound_names(&self) -> Vec<String> {
        self.clauses
            .iter()
            .filter_map(|c| match &c.rhs {
                Rhs::Placeholder(p) => Some(p.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Resolves every placeholder using `map`, returning a new predicate.
    /// Binding is idempotent-by-name: a name this predicate has already
    /// resolved (in this call or an earlier one) may not appear in `map`
    /// again, even though its clause no longer carries a `Placeholder` to
    /// inspect directly — that's what `bound_names` tracks.
    pub fn bind(&self, map: &BindMap) -> Result<Self> {
        let mut out = self.clone();
        for clause in &mut out.clauses {
            if let Rhs::Placeholder(ph) = &clause.rhs {
                let name = ph.to_string();
                if out.bound_names.iter().any(|n| *n == name) {
                    return Err(EngineError::duplicate_binding(&name));
                }
                let value = map
                    .get(ph)
                    .ok_or_else(|| EngineError::unknown_placeholder(&name))?;
                clause.rhs = Rhs::Value(value.clone());
                out.bound_names.push(name);
            }
        }
        Ok(out)
    }

    /// Errors listing every unbound placeholder, for operators that must
    /// refuse `iterate`/`count`/`exists` until bound.
    pub fn require_bound(&self) -> Result<()> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(EngineError::unbound_placeholders(&self.unbound_names()))
        }
    }

    /// Evaluates the (fully bound) predicate against a row. Every clause
    /// must pass (AND semantics); an unbound clause is a logic error the
    /// caller must have already rejected via `require_bound`.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|c| clause_matches(c, row))
    }
}

pub(crate) fn clause_matches(clause: &Clause, row: &Row) -> bool {
    let lhs = row.get(&clause.column).cloned().unwrap_or(Scalar::Null);
    match (&clause.op, &clause.rhs) {
        (CompareOp::Eq, Rhs::Value(v)) => lhs.value_eq(v),
        (CompareOp::Lt, Rhs::Value(v)) => lhs.partial_order(v) == Some(std::cmp::Ordering::Less),
        (CompareOp::Lte, Rhs::Value(v)) => matches!(
            lhs.partial_order(v),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        (CompareOp::Gt, Rhs::Value(v)) => {
            lhs.partial_order(v) == Some(std::cmp::Ordering::Greater)
        }
        (CompareOp::Gte, Rhs::Value(v)) => matches!(
            lhs.partial_order(v),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        (CompareOp::In, Rhs::Values(vs)) => vs.iter().any(|v| lhs.value_eq(v)),
        (CompareOp::Like, Rhs::Value(Scalar::Text(pattern))) => match &lhs {
            Scalar::Text(text) => LikePattern::compile(pattern).is_match(text),
            Scalar::Null => false,
            _ => false,
        },
        _ => false,
    }
}

/// Resolved placeholder bindings supplied by the caller to `Predicate::bind`.
#[derive(Debug, Clone, Default)]
pub struct BindMap {
    named: BTreeMap<String, Scalar>,
    positional: BTreeMap<usize, Scalar>,
}

impl BindMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_positional(mut self, index: usize, value: impl Into<Scalar>) -> Self {
        self.positional.insert(index, value.into());
        self
    }

    fn get(&self, ph: &Placeholder) -> Option<&Scalar> {
        match ph {
            Placeholder::Named(n) => self.named.get(n),
            Placeholder::Positional(i) => self.positional.get(i),
        }
    }
}

/// A bound join predicate carried on the side channel described in §9 — a
/// statically-typed replacement for `get_property("__bind__")`.
pub type EquiConditions = Arc<[(ColumnName, ColumnName)]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_combines_clauses() {
        let p = Predicate::new().eq("dept", "Eng").eq("age", 30);
        let row = Row::new()
            .with("dept", Scalar::Text("Eng".into()))
            .with("age", Scalar::Int(30));
        assert!(p.matches(&row));
        let row2 = Row::new()
            .with("dept", Scalar::Text("Eng".into()))
            .with("age", Scalar::Int(31));
        assert!(!p.matches(&row2));
    }

    #[test]
    fn bind_resolves_named_placeholder() {
        let p = Predicate::new().eq_placeholder("id", Placeholder::Named("user_id".into()));
        assert!(!p.is_bound());
        let bound = p.bind(&BindMap::new().with_named("user_id", 3)).unwrap();
        assert!(bound.is_bound());
        let row = Row::new().with("id", Scalar::Int(3));
        assert!(bound.matches(&row));
    }

    #[test]
    fn bind_unknown_placeholder_errors() {
        let p = Predicate::new().eq_placeholder("id", Placeholder::Named("x".into()));
        assert!(p.bind(&BindMap::new()).is_err());
    }

    #[test]
    fn require_bound_lists_unbound_names() {
        let p = Predicate::new().eq_placeholder("id", Placeholder::Positional(0));
        let err = p.require_bound().unwrap_err();
        assert!(matches!(err, EngineError::Binding(_)));
    }
}
