//! Joins (§4.9): inner/left/right/full equi-joins plus an unrestricted
//! cross join. Equi-join correlations are supplied explicitly by the
//! `equi_conditions` constructor argument rather than threaded through the
//! `get_property("__bind__")` side channel the original design note
//! considered (§9 resolution) — a plain `Vec` the builder validates once,
//! up front, instead of a stringly-typed property lookup every operator
//! downstream would need to know to check for.

use crate::schema::{ColumnName, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone)]
pub struct JoinNode {
    pub left: crate::table::Table,
    pub right: crate::table::Table,
    pub kind: JoinKind,
    pub equi: Vec<(ColumnName, ColumnName)>,
    pub schema: Schema,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// True when either side exposes an index on its half of at least one
/// equi-join column pair, which is what makes the sort-merge strategy
/// viable instead of falling back to block hash-join (§4.9): an index on
/// either side already gives the sort order that side needs for free.
#[must_use]
pub fn has_usable_index(
    left: &Schema,
    right: &Schema,
    equi: &[(ColumnName, ColumnName)],
) -> bool {
    equi.iter().any(|(l, r)| {
        left.find(l).is_some_and(|c| c.index_hint.is_indexed())
            || right.find(r).is_some_and(|c| c.index_hint.is_indexed())
    })
}
