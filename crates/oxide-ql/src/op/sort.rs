//! Sort (§4.5): picks a bounded max-heap top-k strategy when
//! `k = limit + offset` is known and under
//! [`crate::config::EngineConfig::heap_top_k_threshold`], otherwise
//! buffers every row and does a full sort. The heap strategy never holds
//! more than `k` rows in memory at once.

use crate::order::{OrderDef, RowComparator};
use crate::row::{Row, RowId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
pub struct SortNode {
    pub child: crate::table::Table,
    pub keys: Vec<OrderDef>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// A heap entry ordered the *reverse* of the wanted output order, so
/// `BinaryHeap::pop` (which removes the greatest element) always evicts
/// the current worst candidate — a push-then-conditional-pop per incoming
/// row keeps the heap at exactly `k` entries.
struct Ranked<'a> {
    id: RowId,
    row: Row,
    cmp: &'a RowComparator,
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp.compare(&self.row, &other.row) == Ordering::Equal
    }
}
impl Eq for Ranked<'_> {}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp.compare(&self.row, &other.row).reverse()
    }
}

/// Runs the bounded-heap strategy: keeps at most `k = offset + limit` rows,
/// evicting the current worst when a better row arrives, then drains the
/// heap in order and applies `offset` on the way out.
pub fn heap_top_k(
    rows: impl Iterator<Item = (RowId, Row)>,
    cmp: &RowComparator,
    k: usize,
    offset: usize,
) -> Vec<(RowId, Row)> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Ranked<'_>> = BinaryHeap::with_capacity(k + 1);
    for (id, row) in rows {
        heap.push(Ranked { id, row, cmp });
        if heap.len() > k {
            heap.pop();
        }
    }
    // `into_sorted_vec` yields ascending order under our reversed `Ord`,
    // i.e. worst-first; reverse to recover `cmp`'s own ascending order.
    let mut out: Vec<(RowId, Row)> = heap
        .into_sorted_vec()
        .into_iter()
        .map(|r| (r.id, r.row))
        .collect();
    out.reverse();
    out.into_iter().skip(offset).collect()
}

/// Full materialize-then-sort strategy for when `k` is unbounded or above
/// threshold.
pub fn full_sort(
    rows: impl Iterator<Item = (RowId, Row)>,
    cmp: &RowComparator,
    offset: usize,
    limit: Option<usize>,
) -> Vec<(RowId, Row)> {
    let mut buffered: Vec<(RowId, Row)> = rows.collect();
    buffered.sort_by(|a, b| cmp.compare(&a.1, &b.1));
    let iter = buffered.into_iter().skip(offset);
    match limit {
        Some(n) => iter.take(n).collect(),
        None => iter.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, ColumnType, Schema};
    use crate::value::Scalar;

    fn schema() -> Schema {
        Schema::new(vec![ColumnDescriptor::new("n", ColumnType::Int)])
    }

    fn row(n: i64) -> (RowId, Row) {
        (RowId(n as u64), Row::new().with("n", Scalar::Int(n)))
    }

    #[test]
    fn heap_top_k_matches_full_sort_prefix() {
        let schema = schema();
        let cmp = RowComparator::build(&[OrderDef::asc("n")], &schema);
        let rows: Vec<_> = [5, 3, 8, 1, 9, 2, 7].into_iter().map(row).collect();
        let via_heap = heap_top_k(rows.clone().into_iter(), &cmp, 3, 0);
        let via_full = full_sort(rows.into_iter(), &cmp, 0, Some(3));
        let heap_vals: Vec<i64> = via_heap
            .iter()
            .map(|(_, r)| match r.get("n") {
                Some(Scalar::Int(n)) => *n,
                _ => unreachable!(),
            })
            .collect();
        let full_vals: Vec<i64> = via_full
            .iter()
            .map(|(_, r)| match r.get("n") {
                Some(Scalar::Int(n)) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(heap_vals, full_vals);
        assert_eq!(heap_vals, vec![1, 2, 3]);
    }

    #[test]
    fn heap_top_k_respects_offset() {
        let schema = schema();
        let cmp = RowComparator::build(&[OrderDef::asc("n")], &schema);
        let rows: Vec<_> = [5, 3, 8, 1, 9].into_iter().map(row).collect();
        let out = heap_top_k(rows.into_iter(), &cmp, 3, 1);
        let vals: Vec<i64> = out
            .iter()
            .map(|(_, r)| match r.get("n") {
                Some(Scalar::Int(n)) => *n,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(vals, vec![3, 5]);
    }
}
