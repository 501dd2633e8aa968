//! The OR-of-predicates operator (§4.4): a row survives if it matches any
//! of the supplied [`Predicate`]s. Pagination is absorbed from the child
//! the same way [`crate::op::filter::FilterNode`] absorbs it; no fusion
//! exists for `or()` since the alternatives can touch different columns
//! with no common rewrite the way same-column chained filters do.

use crate::predicate::Predicate;

#[derive(Debug, Clone)]
pub struct OrNode {
    pub child: crate::table::Table,
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
    pub offset: usize,
}
