//! The filter operator's node data and its same-column rewrite algebra
//! (§4.3). The algebra is the correctness-critical part of the whole
//! engine: given an existing single-column clause and an incoming one on
//! the *same* column, decide whether the combination fuses into one
//! clause, proves the whole operator empty, or must be kept as two
//! independent AND-combined clauses.

use crate::predicate::{Clause, CompareOp, Rhs};
use crate::value::Scalar;
use std::cmp::Ordering;

/// The node itself: one clause over one child, with pagination absorbed
/// from that child at construction time (§4.3 "absorbs the child's
/// limit/offset").
#[derive(Debug, Clone)]
pub struct FilterNode {
    pub child: crate::table::Table,
    pub clause: Clause,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Result of attempting to fuse an incoming clause into an existing one on
/// the same column.
pub enum FuseOutcome {
    /// The existing clause alone already captures both constraints.
    KeepExisting,
    /// The combination is unsatisfiable; the whole operator is empty.
    Empty,
    /// One clause replaces both (e.g. `in(S)` narrowed to `eq(v)`,
    /// `gte(a)` + `lte(a)` collapsing to `eq(a)`, or a stricter bound
    /// replacing a looser one of the same family).
    Replace(Clause),
    /// Both clauses remain necessary (e.g. `lt(a)` and `gt(b)` forming a
    /// genuine range); the caller keeps both as independent AND clauses.
    Both,
}

/// Applies §4.3's rewrite table (generalized to be order-independent: the
/// spec lists `eq` chained after `lt`, but a caller may just as well call
/// `lt` first then `eq`, so every listed pair is handled in both
/// directions). Unlisted operator combinations (e.g. two `in` clauses)
/// fall back to `Both` — the conservative, always-correct default the
/// spec's "different column | any: wrap normally (no rewrite)" row implies
/// for anything it doesn't explicitly cover.
#[must_use]
pub fn fuse(existing: &Clause, incoming: &Clause) -> FuseOutcome {
    use CompareOp::{Eq, Gt, Gte, In, Like, Lt, Lte};
    match (existing.op, incoming.op) {
        (Eq, Eq) => fuse_eq_eq(existing, incoming),
        (Eq, Lt) => fuse_eq_bound(existing, incoming, Ordering::Less, false),
        (Lt, Eq) => fuse_bound_eq(existing, incoming, Ordering::Less, false),
        (Eq, Gt) => fuse_eq_bound(existing, incoming, Ordering::Greater, false),
        (Gt, Eq) => fuse_bound_eq(existing, incoming, Ordering::Greater, false),
        (Eq, Lte) => fuse_eq_bound(existing, incoming, Ordering::Less, true),
        (Lte, Eq) => fuse_bound_eq(existing, incoming, Ordering::Less, true),
        (Eq, Gte) => fuse_eq_bound(existing, incoming, Ordering::Greater, true),
        (Gte, Eq) => fuse_bound_eq(existing, incoming, Ordering::Greater, true),
        (Lt, Lt) => fuse_same_upper(existing, incoming, false),
        (Lte, Lte) => fuse_same_upper(existing, incoming, true),
        (Gt, Gt) => fuse_same_lower(existing, incoming, false),
        (Gte, Gte) => fuse_same_lower(existing, incoming, true),
        (Lt, Gt) => fuse_range(incoming, existing, false, false),
        (Gt, Lt) => fuse_range(existing, incoming, false, false),
        (Gte, Lte) => fuse_range(existing, incoming, true, true),
        (Lte, Gte) => fuse_range(incoming, existing, true, true),
        (In, Eq) => fuse_in_eq(existing, incoming),
        (Eq, In) => fuse_eq_in(existing, incoming),
        (Like, Eq) => fuse_like_eq(existing, incoming),
        (Eq, Like) => fuse_eq_like(existing, incoming),
        _ => FuseOutcome::Both,
    }
}

fn value_of(c: &Clause) -> Option<&Scalar> {
    match &c.rhs {
        Rhs::Value(v) => Some(v),
        _ => None,
    }
}

fn values_of(c: &Clause) -> Option<&[Scalar]> {
    match &c.rhs {
        Rhs::Values(v) => Some(v),
        _ => None,
    }
}

fn fuse_eq_eq(existing: &Clause, incoming: &Clause) -> FuseOutcome {
    match (value_of(existing), value_of(incoming)) {
        (Some(a), Some(b)) if a.value_eq(b) => FuseOutcome::KeepExisting,
        (Some(_), Some(_)) => FuseOutcome::Empty,
        _ => FuseOutcome::Both,
    }
}

/// `eq(v1)` chained with a bound clause `op(v2)` on the same column. `dir`
/// is `Less` for the upper-bound family (`lt`/`lte`), `Greater` for the
/// lower-bound family (`gt`/`gte`); `inclusive` distinguishes `lte`/`gte`
/// from their strict counterparts.
fn fuse_eq_bound(eq: &Clause, bound: &Clause, dir: Ordering, inclusive: bool) -> FuseOutcome {
    let (Some(v1), Some(v2)) = (value_of(eq), value_of(bound)) else {
        return FuseOutcome::Both;
    };
    let Some(ord) = v1.partial_order(v2) else {
        return FuseOutcome::Both;
    };
    let satisfied = ord == dir || (inclusive && ord == Ordering::Equal);
    if satisfied {
        FuseOutcome::KeepExisting
    } else {
        FuseOutcome::Empty
    }
}

/// Same as `fuse_eq_bound` but the bound clause was seen first.
fn fuse_bound_eq(bound: &Clause, eq: &Clause, dir: Ordering, inclusive: bool) -> FuseOutcome {
    match fuse_eq_bound(eq, bound, dir, inclusive) {
        FuseOutcome::KeepExisting => FuseOutcome::Replace(eq.clone()),
        other => other,
    }
}

/// Two clauses from the same bound family (`lt`+`lt` or `lte`+`lte`): the
/// stricter (smaller) bound wins.
fn fuse_same_upper(existing: &Clause, incoming: &Clause, _inclusive: bool) -> FuseOutcome {
    let (Some(a), Some(b)) = (value_of(existing), value_of(incoming)) else {
        return FuseOutcome::Both;
    };
    match a.partial_order(b) {
        Some(Ordering::Less | Ordering::Equal) => FuseOutcome::KeepExisting,
        Some(Ordering::Greater) => FuseOutcome::Replace(incoming.clone()),
        None => FuseOutcome::Both,
    }
}

/// Two clauses from the same bound family (`gt`+`gt` or `gte`+`gte`): the
/// stricter (larger) bound wins.
fn fuse_same_lower(existing: &Clause, incoming: &Clause, _inclusive: bool) -> FuseOutcome {
    let (Some(a), Some(b)) = (value_of(existing), value_of(incoming)) else {
        return FuseOutcome::Both;
    };
    match a.partial_order(b) {
        Some(Ordering::Greater | Ordering::Equal) => FuseOutcome::KeepExisting,
        Some(Ordering::Less) => FuseOutcome::Replace(incoming.clone()),
        None => FuseOutcome::Both,
    }
}

/// `gt`/`gte` (`lower`) combined with `lt`/`lte` (`upper`) on the same
/// column: a valid range if `lower < upper` (or `<=` when both bounds are
/// inclusive and equal, collapsing to `eq`), empty otherwise.
fn fuse_range(lower: &Clause, upper: &Clause, lower_inclusive: bool, upper_inclusive: bool) -> FuseOutcome {
    let (Some(lo), Some(hi)) = (value_of(lower), value_of(upper)) else {
        return FuseOutcome::Both;
    };
    let Some(ord) = lo.partial_order(hi) else {
        return FuseOutcome::Both;
    };
    match ord {
        Ordering::Less => FuseOutcome::Both,
        Ordering::Equal if lower_inclusive && upper_inclusive => FuseOutcome::Replace(Clause {
            column: lower.column.clone(),
            op: CompareOp::Eq,
            rhs: Rhs::Value(lo.clone()),
        }),
        _ => FuseOutcome::Empty,
    }
}

fn fuse_in_eq(in_clause: &Clause, eq: &Clause) -> FuseOutcome {
    let (Some(set), Some(v)) = (values_of(in_clause), value_of(eq)) else {
        return FuseOutcome::Both;
    };
    if set.iter().any(|s| s.value_eq(v)) {
        FuseOutcome::Replace(eq.clone())
    } else {
        FuseOutcome::Empty
    }
}

fn fuse_eq_in(eq: &Clause, in_clause: &Clause) -> FuseOutcome {
    match fuse_in_eq(in_clause, eq) {
        FuseOutcome::Replace(c) => FuseOutcome::Replace(c),
        other => other,
    }
}

fn fuse_like_eq(like: &Clause, eq: &Clause) -> FuseOutcome {
    let (Some(Scalar::Text(pattern)), Some(Scalar::Text(text))) = (value_of(like), value_of(eq))
    else {
        return FuseOutcome::Both;
    };
    if crate::collation::LikePattern::compile(pattern).is_match(text) {
        FuseOutcome::Replace(eq.clone())
    } else {
        FuseOutcome::Empty
    }
}

fn fuse_eq_like(eq: &Clause, like: &Clause) -> FuseOutcome {
    match fuse_like_eq(like, eq) {
        FuseOutcome::Replace(c) => FuseOutcome::Replace(c),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(v: i64) -> Clause {
        Clause {
            column: "age".into(),
            op: CompareOp::Eq,
            rhs: Rhs::Value(Scalar::Int(v)),
        }
    }
    fn lt(v: i64) -> Clause {
        Clause {
            column: "age".into(),
            op: CompareOp::Lt,
            rhs: Rhs::Value(Scalar::Int(v)),
        }
    }
    fn gt(v: i64) -> Clause {
        Clause {
            column: "age".into(),
            op: CompareOp::Gt,
            rhs: Rhs::Value(Scalar::Int(v)),
        }
    }

    #[test]
    fn eq_eq_same_value_keeps_existing() {
        assert!(matches!(fuse(&eq(5), &eq(5)), FuseOutcome::KeepExisting));
    }

    #[test]
    fn eq_eq_different_value_is_empty() {
        assert!(matches!(fuse(&eq(5), &eq(6)), FuseOutcome::Empty));
    }

    #[test]
    fn eq_then_consistent_lt_keeps_existing() {
        assert!(matches!(fuse(&eq(5), &lt(10)), FuseOutcome::KeepExisting));
    }

    #[test]
    fn eq_then_contradicting_lt_is_empty() {
        assert!(matches!(fuse(&eq(10), &lt(5)), FuseOutcome::Empty));
    }

    #[test]
    fn lt_then_stricter_lt_replaces() {
        match fuse(&lt(10), &lt(5)) {
            FuseOutcome::Replace(c) => assert_eq!(value_of(&c), Some(&Scalar::Int(5))),
            _ => panic!("expected replace"),
        }
    }

    #[test]
    fn lt_then_looser_lt_keeps_existing() {
        assert!(matches!(fuse(&lt(5), &lt(10)), FuseOutcome::KeepExisting));
    }

    #[test]
    fn valid_range_keeps_both() {
        assert!(matches!(fuse(&gt(40), &lt(20)), FuseOutcome::Empty));
        assert!(matches!(fuse(&gt(5), &lt(20)), FuseOutcome::Both));
    }

    #[test]
    fn gte_lte_same_value_collapses_to_eq() {
        let gte = Clause {
            column: "age".into(),
            op: CompareOp::Gte,
            rhs: Rhs::Value(Scalar::Int(30)),
        };
        let lte = Clause {
            column: "age".into(),
            op: CompareOp::Lte,
            rhs: Rhs::Value(Scalar::Int(30)),
        };
        match fuse(&gte, &lte) {
            FuseOutcome::Replace(c) => assert_eq!(c.op, CompareOp::Eq),
            _ => panic!("expected eq collapse"),
        }
    }

    #[test]
    fn in_then_member_eq_replaces_with_eq() {
        let in_clause = Clause {
            column: "id".into(),
            op: CompareOp::In,
            rhs: Rhs::Values(vec![Scalar::Int(1), Scalar::Int(2)]),
        };
        match fuse(&in_clause, &eq(1).with_column("id")) {
            FuseOutcome::Replace(c) => assert_eq!(c.op, CompareOp::Eq),
            _ => panic!("expected replace with eq"),
        }
    }

    #[test]
    fn unlisted_combo_falls_back_to_both() {
        let in_a = Clause {
            column: "id".into(),
            op: CompareOp::In,
            rhs: Rhs::Values(vec![Scalar::Int(1)]),
        };
        let in_b = Clause {
            column: "id".into(),
            op: CompareOp::In,
            rhs: Rhs::Values(vec![Scalar::Int(2)]),
        };
        assert!(matches!(fuse(&in_a, &in_b), FuseOutcome::Both));
    }

    impl Clause {
        fn with_column(mut self, c: &str) -> Self {
            self.column = c.into();
            self
        }
    }
}
