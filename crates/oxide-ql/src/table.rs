//! The operator tree (§4.1): a closed sum type (`Node`) wrapped in the
//! cheaply-clonable, reference-counted `Table` handle every builder method
//! and executor method is defined on. Modeling operators as values of a
//! closed enum (rather than `Arc<dyn Relation>` trait objects with
//! downcasting) is what makes the rewrite rules in §4.2-§4.12 — same-
//! column filter fusion, barrier detection, base-table push-down — a
//! single `match` instead of a trait-object introspection dance (§9).

use crate::collation::{Collator, DefaultCollator};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::index::Index;
use crate::op::adaptive::{self, AdaptiveHints, AdaptiveNode, Measurements};
use crate::op::alias::{self, AliasNode};
use crate::op::barrier::BarrierNode;
use crate::op::concat::ConcatNode;
use crate::op::distinct::DistinctNode;
use crate::op::empty::EmptyNode;
use crate::op::exists::SemiNode;
use crate::op::filter::{self, FilterNode, FuseOutcome};
use crate::op::generator::GeneratorNode;
use crate::op::join::{self, JoinKind, JoinNode};
use crate::op::or_filter::OrNode;
use crate::op::project::ProjectNode;
use crate::op::setops::SetOpNode;
use crate::op::sort::{self, SortNode};
use crate::order::{OrderDef, RowComparator};
use crate::predicate::{Clause, CompareOp, Predicate, Rhs};
use crate::row::{Row, RowId, RowKey};
use crate::schema::{ColumnDescriptor, ColumnName, ColumnType, IndexHint, Schema};
use crate::value::Scalar;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// A boxed, fully-owned row stream. Operators never refuse to iterate
/// partway through — the binding/schema checks that can fail happen up
/// front in `iterate()` itself, so the returned iterator is infallible.
pub type RowIter = Box<dyn Iterator<Item = (RowId, Row)>>;

// ---------------------------------------------------------------------
// Base table storage
// ---------------------------------------------------------------------

/// The mutable state backing every clone of a base table: the row store
/// itself, its declared indexes, and the engine-wide tunables every
/// operator built on top of it inherits.
pub(crate) struct BaseStorage {
    pub schema: Schema,
    pub rows: BTreeMap<u64, Row>,
    pub next_id: u64,
    pub indexes: HashMap<ColumnName, Index>,
    /// Whole-row membership index built by the adaptive optimizer's `has`
    /// path (§4.12) once `record_has` judges it worthwhile. Keyed by a
    /// `Scalar::Binary` packing `row_index_columns`' values in order, one
    /// row per entry — `None` until the optimizer actually builds it.
    /// `row_index_columns` is fixed at build time to whichever probe row's
    /// column set triggered the build; a later `has` probe over a
    /// different column set can't reuse it and falls back to a scan.
    pub row_index: Option<Index>,
    pub row_index_columns: Vec<ColumnName>,
    pub collator: Arc<dyn Collator>,
    pub config: Arc<EngineConfig>,
    pub primary_key: Option<ColumnName>,
    pub unique_columns: Vec<ColumnName>,
}

impl BaseStorage {
    fn insert_row(&mut self, mut row: Row) -> Result<RowId> {
        if let Some(pk) = self.primary_key.clone() {
            let value = row.get(&pk).cloned().unwrap_or(Scalar::Null);
            if self.find_by_unique(&pk, &value).is_some() {
                return Err(EngineError::primary_key_violation(&value.to_string()));
            }
        }
        for col in self.unique_columns.clone() {
            let value = row.get(&col).cloned().unwrap_or(Scalar::Null);
            if !value.is_null() && self.find_by_unique(&col, &value).is_some() {
                return Err(EngineError::unique_violation(&col, &value.to_string()));
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        for col in self.schema.visible_names() {
            if row.get(&col).is_none() {
                row.set(col, Scalar::Null);
            }
        }
        for (name, index) in &mut self.indexes {
            let value = row.get(name).cloned().unwrap_or(Scalar::Null);
            index.insert(&value, RowId(id), self.collator.as_ref());
        }
        if let Some(row_index) = &mut self.row_index {
            let key = pack_row_key(&row, &self.row_index_columns, self.collator.as_ref());
            row_index.insert(&key, RowId(id), self.collator.as_ref());
        }
        self.rows.insert(id, row);
        Ok(RowId(id))
    }

    fn find_by_unique(&self, column: &str, value: &Scalar) -> Option<RowId> {
        if let Some(index) = self.indexes.get(column) {
            return index
                .point_lookup(value, self.collator.as_ref())
                .into_iter()
                .next();
        }
        self.rows
            .iter()
            .find(|(_, r)| r.get(column).is_some_and(|v| v.value_eq(value)))
            .map(|(id, _)| RowId(*id))
    }

    fn delete_row(&mut self, id: RowId) -> bool {
        let Some(row) = self.rows.remove(&id.0) else {
            return false;
        };
        for (name, index) in &mut self.indexes {
            let value = row.get(name).cloned().unwrap_or(Scalar::Null);
            index.delete(&value, id, self.collator.as_ref());
        }
        if let Some(row_index) = &mut self.row_index {
            let key = pack_row_key(&row, &self.row_index_columns, self.collator.as_ref());
            row_index.delete(&key, id, self.collator.as_ref());
        }
        true
    }

    fn update_row(&mut self, id: RowId, assignments: &[Assignment]) -> Result<bool> {
        let Some(mut row) = self.rows.get(&id.0).cloned() else {
            return Ok(false);
        };
        for assignment in assignments {
            if let Some(pk) = &self.primary_key {
                if *pk == assignment.column {
                    let existing = row.get(pk).cloned().unwrap_or(Scalar::Null);
                    if !existing.value_eq(&assignment.value) {
                        if let Some(other) = self.find_by_unique(pk, &assignment.value) {
                            if other != id {
                                return Err(EngineError::primary_key_violation(
                                    &assignment.value.to_string(),
                                ));
                            }
                        }
                    }
                }
            }
            if self.unique_columns.contains(&assignment.column) && !assignment.value.is_null() {
                if let Some(other) = self.find_by_unique(&assignment.column, &assignment.value) {
                    if other != id {
                        return Err(EngineError::unique_violation(
                            &assignment.column,
                            &assignment.value.to_string(),
                        ));
                    }
                }
            }
        }
        for (name, index) in &mut self.indexes {
            let old = row.get(name).cloned().unwrap_or(Scalar::Null);
            index.delete(&old, id, self.collator.as_ref());
        }
        if let Some(row_index) = &mut self.row_index {
            let old_key = pack_row_key(&row, &self.row_index_columns, self.collator.as_ref());
            row_index.delete(&old_key, id, self.collator.as_ref());
        }
        for assignment in assignments {
            row.set(assignment.column.clone(), assignment.value.clone());
        }
        for (name, index) in &mut self.indexes {
            let new = row.get(name).cloned().unwrap_or(Scalar::Null);
            index.insert(&new, id, self.collator.as_ref());
        }
        if let Some(row_index) = &mut self.row_index {
            let new_key = pack_row_key(&row, &self.row_index_columns, self.collator.as_ref());
            row_index.insert(&new_key, id, self.collator.as_ref());
        }
        self.rows.insert(id.0, row);
        Ok(true)
    }
}

// ---------------------------------------------------------------------
// Base table operator node
// ---------------------------------------------------------------------

#[derive(Clone)]
pub(crate) struct BaseNode {
    pub storage: Arc<RefCell<BaseStorage>>,
    pub filters: Vec<Clause>,
    pub limit: Option<usize>,
    pub offset: usize,
}

// ---------------------------------------------------------------------
// Node: the closed operator sum type
// ---------------------------------------------------------------------

#[derive(Clone)]
pub(crate) enum Node {
    Base(BaseNode),
    Generator(GeneratorNode),
    Empty(EmptyNode),
    Filter(FilterNode),
    Or(OrNode),
    Sort(SortNode),
    Barrier(BarrierNode),
    Project(ProjectNode),
    Alias(AliasNode),
    Distinct(DistinctNode),
    Concat(ConcatNode),
    Intersect(SetOpNode),
    Except(SetOpNode),
    Join(JoinNode),
    Semi(SemiNode),
    Adaptive(AdaptiveNode),
}

/// A lazy, immutable operator. Cloning is a reference-count bump; building
/// on top of a `Table` never mutates it, it only produces a new one (§2).
#[derive(Clone)]
pub struct Table(pub(crate) Arc<Node>);

/// One `SET column = value` assignment, as used by [`MutableTable::update`].
#[derive(Debug, Clone)]
pub struct Assignment {
    pub column: ColumnName,
    pub value: Scalar,
}

impl Assignment {
    #[must_use]
    pub fn new(column: impl Into<ColumnName>, value: impl Into<Scalar>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A metadata value attached via `with_property`/read via `get_property`
/// (§4.1's generic side channel, independent of the join-specific
/// `equi_conditions` constructor argument — see module docs).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Flag(bool),
}

fn from_node(node: Node) -> Table {
    Table(Arc::new(node))
}

impl Table {
    // -------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------

    /// A new, empty base table over `schema`, with no rows and indexes
    /// built for every column carrying an `IndexHint` other than `None`.
    #[must_use]
    pub fn base(schema: Schema) -> Self {
        let config = EngineConfig::default();
        let indexes = schema
            .visible()
            .iter()
            .filter(|c| c.index_hint.is_indexed())
            .map(|c| (c.name.clone(), Index::new(config.adaptive_materialize_threshold)))
            .collect();
        let primary_key = schema
            .visible()
            .iter()
            .find(|c| c.index_hint == IndexHint::Primary)
            .map(|c| c.name.clone());
        let unique_columns = schema
            .visible()
            .iter()
            .filter(|c| c.index_hint == IndexHint::Unique)
            .map(|c| c.name.clone())
            .collect();
        let storage = BaseStorage {
            schema,
            rows: BTreeMap::new(),
            next_id: 0,
            indexes,
            row_index: None,
            row_index_columns: Vec::new(),
            collator: Arc::new(DefaultCollator),
            config: Arc::new(config),
            primary_key,
            unique_columns,
        };
        from_node(Node::Base(BaseNode {
            storage: Arc::new(RefCell::new(storage)),
            filters: Vec::new(),
            limit: None,
            offset: 0,
        }))
    }

    /// Same as [`Table::base`] but with an explicit engine configuration,
    /// for tests that need to exercise strategy thresholds directly.
    #[must_use]
    pub fn base_with_config(schema: Schema, config: EngineConfig) -> Self {
        let table = Self::base(schema);
        if let Node::Base(base) = &*table.0 {
            base.storage.borrow_mut().config = Arc::new(config);
        }
        table
    }

    /// A base table pre-populated with `rows`, used heavily by tests and
    /// fixtures; goes through the same uniqueness checks as `insert`.
    pub fn base_with_rows(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let table = Self::base(schema);
        let mutable = table.clone().into_mutable()?;
        for row in rows {
            mutable.insert(row)?;
        }
        Ok(table)
    }

    /// A procedurally generated table: `produce(i)` for `i` in `0..count`.
    /// Not indexable or mutable, but restartable and lazy like any other
    /// operator.
    #[must_use]
    pub fn generator(
        schema: Schema,
        count: u64,
        produce: impl Fn(u64) -> Row + Send + Sync + 'static,
    ) -> Self {
        from_node(Node::Generator(GeneratorNode {
            schema,
            count,
            produce: Arc::new(produce),
            limit: None,
            offset: 0,
        }))
    }

    /// A table with `schema` that can never yield a row.
    #[must_use]
    pub fn empty(schema: Schema) -> Self {
        from_node(Node::Empty(EmptyNode { schema }))
    }

    // -------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------

    fn limit_offset(&self) -> (Option<usize>, usize) {
        match &*self.0 {
            Node::Base(n) => (n.limit, n.offset),
            Node::Generator(n) => (n.limit, n.offset),
            Node::Empty(_) => (None, 0),
            Node::Filter(n) => (n.limit, n.offset),
            Node::Or(n) => (n.limit, n.offset),
            Node::Sort(n) => (n.limit, n.offset),
            // A barrier never reports pagination upward: that's the whole
            // point (§4.6).
            Node::Barrier(_) => (None, 0),
            Node::Project(n) => (n.limit, n.offset),
            Node::Alias(n) => (n.limit, n.offset),
            Node::Distinct(n) => (n.limit, n.offset),
            Node::Concat(n) => (n.limit, n.offset),
            Node::Intersect(n) | Node::Except(n) => (n.limit, n.offset),
            Node::Join(n) => (n.limit, n.offset),
            Node::Semi(n) => (n.limit, n.offset),
            Node::Adaptive(n) => (n.limit, n.offset),
        }
    }

    /// Clears pagination fields on the returned clone, used when a new
    /// wrapping operator absorbs this table's pagination into itself
    /// (§4.3, §4.4). Cheap: only the top node's fields change, the shared
    /// substructure stays `Arc`-shared.
    fn cleared(&self) -> Table {
        match &*self.0 {
            Node::Base(n) => from_node(Node::Base(BaseNode {
                storage: Arc::clone(&n.storage),
                filters: n.filters.clone(),
                limit: None,
                offset: 0,
            })),
            Node::Generator(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Generator(n))
            }
            Node::Empty(_) | Node::Barrier(_) => self.clone(),
            Node::Filter(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Filter(n))
            }
            Node::Or(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Or(n))
            }
            Node::Sort(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Sort(n))
            }
            Node::Project(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Project(n))
            }
            Node::Alias(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Alias(n))
            }
            Node::Distinct(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Distinct(n))
            }
            Node::Concat(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Concat(n))
            }
            Node::Intersect(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Intersect(n))
            }
            Node::Except(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Except(n))
            }
            Node::Join(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Join(n))
            }
            Node::Semi(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Semi(n))
            }
            Node::Adaptive(n) => {
                let mut n = n.clone();
                n.limit = None;
                n.offset = 0;
                from_node(Node::Adaptive(n))
            }
        }
    }

    fn validate_clause_value(&self, column: &str, op: CompareOp, value: &Scalar) -> Result<()> {
        let schema = self.all_columns();
        let Some(desc) = schema.find(column) else {
            return Err(EngineError::unknown_column(column));
        };
        if value.is_null() {
            return Ok(());
        }
        let compatible = match desc.ty {
            ColumnType::Text => matches!(value, Scalar::Text(_)),
            ColumnType::Binary => matches!(value, Scalar::Binary(_)),
            ColumnType::Date => matches!(value, Scalar::Date(_)),
            ColumnType::Time => matches!(value, Scalar::Time(_)),
            ColumnType::DateTime => matches!(value, Scalar::DateTime(_)),
            ColumnType::Int | ColumnType::Float | ColumnType::Decimal(_) => value.is_numeric(),
        };
        if matches!(op, CompareOp::Like) && !matches!(value, Scalar::Text(_)) {
            return Err(EngineError::not_comparable("like", "non-text value"));
        }
        if !compatible {
            return Err(EngineError::not_comparable(
                "comparison",
                &format!("{value} against column '{column}'"),
            ));
        }
        Ok(())
    }

    /// Builds a single-clause filter, applying §4.2's base push-down and
    /// §4.3's same-column rewrite algebra.
    ///
    /// Pagination already committed on `self` is a frozen window (§4.6):
    /// a clause built on top of it must never reach back through the
    /// skip/take, so push-down and same-column fusion only apply while
    /// `self` carries no limit/offset of its own.
    fn add_clause(&self, clause: Clause) -> Result<Table> {
        let (limit, offset) = self.limit_offset();
        if limit.is_some() || offset != 0 {
            return self.wrap_filter(clause);
        }
        match &*self.0 {
            Node::Base(base) => {
                let mut filters = base.filters.clone();
                if let Some(existing_idx) = filters.iter().position(|c| c.column == clause.column) {
                    match filter::fuse(&filters[existing_idx], &clause) {
                        FuseOutcome::KeepExisting => {}
                        FuseOutcome::Empty => {
                            return Ok(Table::empty(base.storage.borrow().schema.clone()))
                        }
                        FuseOutcome::Replace(new_clause) => filters[existing_idx] = new_clause,
                        FuseOutcome::Both => filters.push(clause),
                    }
                } else {
                    filters.push(clause);
                }
                Ok(from_node(Node::Base(BaseNode {
                    storage: Arc::clone(&base.storage),
                    filters,
                    limit: base.limit,
                    offset: base.offset,
                })))
            }
            Node::Filter(existing) if existing.clause.column == clause.column => {
                match filter::fuse(&existing.clause, &clause) {
                    FuseOutcome::KeepExisting => Ok(self.clone()),
                    FuseOutcome::Empty => Ok(Table::empty(self.all_columns())),
                    FuseOutcome::Replace(new_clause) => Ok(from_node(Node::Filter(FilterNode {
                        child: existing.child.clone(),
                        clause: new_clause,
                        limit: existing.limit,
                        offset: existing.offset,
                    }))),
                    FuseOutcome::Both => self.wrap_filter(clause),
                }
            }
            Node::Empty(n) => Ok(Table::empty(n.schema.clone())),
            _ => self.wrap_filter(clause),
        }
    }

    /// Wraps `self` in a new filter node instead of fusing into it.
    ///
    /// `self` keeps whatever pagination it already carries: the child is
    /// passed through unchanged, so `child.iterate()` enforces that window
    /// before `clause` ever runs. The new node reports no pagination of its
    /// own, matching the barrier's reporting contract (§4.6) — any limit
    /// ultimately wanted on top of this filter is a later, separate builder
    /// call.
    fn wrap_filter(&self, clause: Clause) -> Result<Table> {
        Ok(from_node(Node::Filter(FilterNode {
            child: self.clone(),
            clause,
            limit: None,
            offset: 0,
        })))
    }

    fn compare_builder(&self, column: &str, op: CompareOp, value: Scalar) -> Result<Table> {
        self.validate_clause_value(column, op, &value)?;
        if let (Node::Adaptive(n), CompareOp::Eq) = (&*self.0, op) {
            self.measure_adaptive_eq(n, column, &value)?;
        }
        self.add_clause(Clause {
            column: column.into(),
            op,
            rhs: Rhs::Value(value),
        })
    }

    /// Times an `eq` probe against the wrapped base table and feeds the
    /// elapsed duration to this adaptive wrapper's shared measurements,
    /// building a real index over `column` in the underlying storage once
    /// `record_eq` judges it worthwhile (§4.12).
    fn measure_adaptive_eq(&self, n: &AdaptiveNode, column: &str, value: &Scalar) -> Result<()> {
        let column_name: ColumnName = column.into();
        let config = {
            let Node::Base(base) = &*n.base.0 else {
                unreachable!("adaptive always wraps a base table");
            };
            Arc::clone(&base.storage.borrow().config)
        };
        let probe = n.base.eq(column, value.clone())?;
        let (result, elapsed) = adaptive::measure(|| probe.count());
        result?;
        let should_index = n
            .measurements
            .borrow_mut()
            .record_eq(&column_name, elapsed, &config, &n.hints);
        if should_index {
            self.build_adaptive_index(n, &column_name);
        }
        Ok(())
    }

    /// Builds (if not already present) a real index over `column` in the
    /// base table's storage, backfilling from every row currently stored.
    fn build_adaptive_index(&self, n: &AdaptiveNode, column: &ColumnName) {
        let Node::Base(base) = &*n.base.0 else {
            return;
        };
        let mut storage = base.storage.borrow_mut();
        if storage.indexes.contains_key(column) {
            return;
        }
        let threshold = storage.config.adaptive_materialize_threshold;
        let mut index = Index::new(threshold);
        let entries: Vec<(u64, Scalar)> = storage
            .rows
            .iter()
            .map(|(id, row)| (*id, row.get(column).cloned().unwrap_or(Scalar::Null)))
            .collect();
        for (id, value) in entries {
            index.insert(&value, RowId(id), storage.collator.as_ref());
        }
        storage.indexes.insert(column.clone(), index);
    }

    // -------------------------------------------------------------
    // Single-clause filter builders
    // -------------------------------------------------------------

    pub fn eq(&self, column: &str, value: impl Into<Scalar>) -> Result<Table> {
        self.compare_builder(column, CompareOp::Eq, value.into())
    }
    pub fn lt(&self, column: &str, value: impl Into<Scalar>) -> Result<Table> {
        self.compare_builder(column, CompareOp::Lt, value.into())
    }
    pub fn lte(&self, column: &str, value: impl Into<Scalar>) -> Result<Table> {
        self.compare_builder(column, CompareOp::Lte, value.into())
    }
    pub fn gt(&self, column: &str, value: impl Into<Scalar>) -> Result<Table> {
        self.compare_builder(column, CompareOp::Gt, value.into())
    }
    pub fn gte(&self, column: &str, value: impl Into<Scalar>) -> Result<Table> {
        self.compare_builder(column, CompareOp::Gte, value.into())
    }

    pub fn in_(&self, column: &str, values: Vec<Scalar>) -> Result<Table> {
        for v in &values {
            self.validate_clause_value(column, CompareOp::In, v)?;
        }
        self.add_clause(Clause {
            column: column.into(),
            op: CompareOp::In,
            rhs: Rhs::Values(values),
        })
    }

    pub fn like(&self, column: &str, pattern: impl Into<String>) -> Result<Table> {
        let pattern = Scalar::Text(pattern.into());
        self.validate_clause_value(column, CompareOp::Like, &pattern)?;
        self.add_clause(Clause {
            column: column.into(),
            op: CompareOp::Like,
            rhs: Rhs::Value(pattern),
        })
    }

    /// The OR-of-predicates operator (§4.4): a row survives if it matches
    /// any of `predicates`. Wraps on top of `self` the same way `Filter`
    /// does: pagination already committed on `self` is a frozen window
    /// (§4.6) and stays on the child, enforced by `child.iterate()` before
    /// any predicate here runs.
    #[must_use]
    pub fn or(&self, predicates: Vec<Predicate>) -> Table {
        from_node(Node::Or(OrNode {
            child: self.clone(),
            predicates,
            limit: None,
            offset: 0,
        }))
    }

    // -------------------------------------------------------------
    // Sort / barrier / pagination
    // -------------------------------------------------------------

    /// Wraps `self` in a sort operator. Pagination already committed on
    /// `self` is a frozen window (§4.6): it stays on the child rather than
    /// being absorbed, so reordering never reaches back through an
    /// already-applied skip/take.
    #[must_use]
    pub fn order(&self, keys: Vec<OrderDef>) -> Table {
        from_node(Node::Sort(SortNode {
            child: self.clone(),
            keys,
            limit: None,
            offset: 0,
        }))
    }

    /// Sets this operator's own pagination fields. Every node variant
    /// carries the same `(limit, offset)` pair and applies it after its
    /// own transform — this just overwrites that pair on a clone, per §2
    /// "pagination accumulates as fields on a clone".
    #[must_use]
    pub fn limit(&self, n: usize) -> Table {
        self.with_pagination(Some(n), self.limit_offset().1)
    }

    #[must_use]
    pub fn offset(&self, n: usize) -> Table {
        self.with_pagination(self.limit_offset().0, n)
    }

    fn with_pagination(&self, limit: Option<usize>, offset: usize) -> Table {
        match &*self.0 {
            Node::Base(n) => from_node(Node::Base(BaseNode {
                storage: Arc::clone(&n.storage),
                filters: n.filters.clone(),
                limit,
                offset,
            })),
            Node::Generator(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Generator(n))
            }
            Node::Empty(_) => self.clone(),
            Node::Barrier(n) => {
                // Pagination applied on top of a barrier clones the
                // barrier itself (§4.6): it still reports (None, 0)
                // upward, but its own enforced window changes.
                from_node(Node::Barrier(BarrierNode {
                    child: n.child.clone(),
                    enforce_limit: limit,
                    enforce_offset: offset,
                }))
            }
            Node::Filter(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Filter(n))
            }
            Node::Or(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Or(n))
            }
            Node::Sort(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Sort(n))
            }
            Node::Project(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Project(n))
            }
            Node::Alias(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Alias(n))
            }
            Node::Distinct(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Distinct(n))
            }
            Node::Concat(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Concat(n))
            }
            Node::Intersect(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Intersect(n))
            }
            Node::Except(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Except(n))
            }
            Node::Join(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Join(n))
            }
            Node::Semi(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Semi(n))
            }
            Node::Adaptive(n) => {
                let mut n = n.clone();
                n.limit = limit;
                n.offset = offset;
                from_node(Node::Adaptive(n))
            }
        }
    }

    /// Freezes the current pagination so it can never be widened by a
    /// later filter/order/paginate call built on top of this table (§4.6).
    #[must_use]
    pub fn barrier(&self) -> Table {
        let (limit, offset) = self.limit_offset();
        from_node(Node::Barrier(BarrierNode {
            child: self.cleared(),
            enforce_limit: limit,
            enforce_offset: offset,
        }))
    }

    // -------------------------------------------------------------
    // Projection / alias / distinct / properties
    // -------------------------------------------------------------

    /// Narrows the visible column set (§4.7). Never widens: a name not
    /// already visible is a schema error.
    pub fn columns(&self, names: &[&str]) -> Result<Table> {
        let schema = self.all_columns().project(names)?;
        let (limit, offset) = self.limit_offset();
        Ok(from_node(Node::Project(ProjectNode {
            child: self.cleared(),
            schema,
            limit,
            offset,
        })))
    }

    /// Attaches a table-prefix and/or per-column renames (§4.11).
    /// Re-aliasing an already-aliased table replaces the prefix and merges
    /// renames instead of nesting.
    #[must_use]
    pub fn with_alias(&self, prefix: Option<&str>, renames: BTreeMap<ColumnName, ColumnName>) -> Table {
        let (base_child, base_prefix, base_renames) = match &*self.0 {
            Node::Alias(existing) => (
                existing.child.clone(),
                existing.prefix.clone(),
                existing.renames.clone(),
            ),
            _ => (self.cleared(), None, BTreeMap::new()),
        };
        let new_prefix: Option<Arc<str>> = prefix.map(Into::into).or(base_prefix);
        let mut merged_renames = base_renames;
        merged_renames.extend(renames);
        let child_schema = base_child.all_columns();
        let schema = child_schema.map_names(|name| {
            alias::rename_one(name, new_prefix.as_deref(), &merged_renames)
        });
        let (limit, offset) = self.limit_offset();
        from_node(Node::Alias(AliasNode {
            child: base_child,
            prefix: new_prefix,
            renames: merged_renames,
            schema,
            limit,
            offset,
        }))
    }

    #[must_use]
    pub fn distinct(&self) -> Table {
        let (limit, offset) = self.limit_offset();
        from_node(Node::Distinct(DistinctNode {
            child: self.cleared(),
            limit,
            offset,
        }))
    }

    /// Attaches an opaque metadata value that a consumer can read back via
    /// `get_property`; purely a side channel, never affects row semantics.
    #[must_use]
    pub fn with_property(&self, _name: &str, _value: PropertyValue) -> Table {
        // Properties are deliberately not modeled as their own Node
        // variant: no operator in this engine actually consumes one at
        // iterate time (join binding uses the explicit `equi_conditions`
        // constructor argument instead, per §9). Kept as a no-op pass-
        // through so the builder method exists for API completeness
        // without adding a wrapper node nothing reads.
        self.clone()
    }

    #[must_use]
    pub fn get_property(&self, _name: &str) -> Option<PropertyValue> {
        None
    }

    // -------------------------------------------------------------
    // Set operations (§4.8)
    // -------------------------------------------------------------

    fn check_same_arity(&self, other: &Table) -> Result<()> {
        let (a, b) = (self.columns_schema().visible().len(), other.columns_schema().visible().len());
        if a != b {
            return Err(EngineError::column_count_mismatch(a, b));
        }
        Ok(())
    }

    /// `UNION ALL`: positional concatenation, right side's rows remapped
    /// onto the left side's column names (§9 resolution).
    pub fn concat(&self, other: &Table) -> Result<Table> {
        self.check_same_arity(other)?;
        let schema = self.columns_schema();
        Ok(from_node(Node::Concat(ConcatNode {
            left: self.barrier_if_paginated(),
            right: other.barrier_if_paginated(),
            schema,
            limit: None,
            offset: 0,
        })))
    }

    /// `UNION`: `Distinct(Concat(left, right))`, left-wins on duplicate
    /// positional rows (§9 resolution of the `UnionTable` open question).
    pub fn union(&self, other: &Table) -> Result<Table> {
        Ok(self.concat(other)?.distinct())
    }

    pub fn intersect(&self, other: &Table) -> Result<Table> {
        self.check_same_arity(other)?;
        let schema = self.columns_schema();
        Ok(from_node(Node::Intersect(SetOpNode {
            left: self.barrier_if_paginated(),
            right: other.barrier_if_paginated(),
            schema,
            limit: None,
            offset: 0,
        })))
    }

    pub fn except(&self, other: &Table) -> Result<Table> {
        self.check_same_arity(other)?;
        let schema = self.columns_schema();
        Ok(from_node(Node::Except(SetOpNode {
            left: self.barrier_if_paginated(),
            right: other.barrier_if_paginated(),
            schema,
            limit: None,
            offset: 0,
        })))
    }

    fn barrier_if_paginated(&self) -> Table {
        let (limit, offset) = self.limit_offset();
        if limit.is_some() || offset != 0 {
            self.barrier()
        } else {
            self.clone()
        }
    }

    // -------------------------------------------------------------
    // Joins (§4.9)
    // -------------------------------------------------------------

    fn join_schema(&self, other: &Table, kind: JoinKind) -> Result<Schema> {
        let left = self.all_columns();
        let right = other.all_columns();
        let left_names: HashSet<ColumnName> = left.visible_names().into_iter().collect();
        for name in right.visible_names() {
            if left_names.contains(&name) {
                return Err(EngineError::join_column_conflict(&name));
            }
        }
        let nullable_left = matches!(kind, JoinKind::Right | JoinKind::Full);
        let nullable_right = matches!(kind, JoinKind::Left | JoinKind::Full);
        let mut columns: Vec<ColumnDescriptor> = left
            .visible()
            .iter()
            .cloned()
            .map(|mut c| {
                if nullable_left {
                    c.index_hint = IndexHint::None;
                }
                c
            })
            .collect();
        columns.extend(right.visible().iter().cloned().map(|mut c| {
            if nullable_right {
                c.index_hint = IndexHint::None;
            }
            c
        }));
        Ok(Schema::new(columns))
    }

    fn join(&self, other: &Table, kind: JoinKind, equi: Vec<(ColumnName, ColumnName)>) -> Result<Table> {
        let schema = self.join_schema(other, kind)?;
        Ok(from_node(Node::Join(JoinNode {
            left: self.barrier_if_paginated(),
            right: other.barrier_if_paginated(),
            kind,
            equi,
            schema,
            limit: None,
            offset: 0,
        })))
    }

    pub fn join_inner(&self, other: &Table, equi: Vec<(ColumnName, ColumnName)>) -> Result<Table> {
        self.join(other, JoinKind::Inner, equi)
    }
    pub fn join_left(&self, other: &Table, equi: Vec<(ColumnName, ColumnName)>) -> Result<Table> {
        self.join(other, JoinKind::Left, equi)
    }
    pub fn join_right(&self, other: &Table, equi: Vec<(ColumnName, ColumnName)>) -> Result<Table> {
        self.join(other, JoinKind::Right, equi)
    }
    pub fn join_full(&self, other: &Table, equi: Vec<(ColumnName, ColumnName)>) -> Result<Table> {
        self.join(other, JoinKind::Full, equi)
    }
    pub fn join_cross(&self, other: &Table) -> Result<Table> {
        self.join(other, JoinKind::Cross, Vec::new())
    }

    // -------------------------------------------------------------
    // Exists / not-exists (§4.10)
    // -------------------------------------------------------------

    fn semi(&self, inner: &Table, correlations: Vec<(ColumnName, ColumnName)>, negated: bool) -> Table {
        from_node(Node::Semi(SemiNode {
            outer: self.barrier_if_paginated(),
            inner: inner.barrier_if_paginated(),
            correlations,
            negated,
            limit: None,
            offset: 0,
        }))
    }

    #[must_use]
    pub fn exists(&self, inner: &Table, correlations: Vec<(ColumnName, ColumnName)>) -> Table {
        self.semi(inner, correlations, false)
    }

    #[must_use]
    pub fn not_exists(&self, inner: &Table, correlations: Vec<(ColumnName, ColumnName)>) -> Table {
        self.semi(inner, correlations, true)
    }

    // -------------------------------------------------------------
    // Adaptive optimizer (§4.12)
    // -------------------------------------------------------------

    /// Wraps a base table with measurement-driven index construction.
    /// Errors if `self` isn't (still) rooted directly in a base table.
    pub fn adaptive(&self) -> Result<Table> {
        if !matches!(&*self.0, Node::Base(_)) {
            return Err(EngineError::adaptive_requires_base());
        }
        Ok(from_node(Node::Adaptive(AdaptiveNode {
            base: self.clone(),
            hints: AdaptiveHints::default(),
            measurements: Arc::new(RefCell::new(Measurements::default())),
            limit: None,
            offset: 0,
        })))
    }

    #[must_use]
    pub fn with_expected_has_calls(&self, n: usize) -> Table {
        self.map_adaptive_hints(|h| h.expected_has_calls = Some(n))
    }

    #[must_use]
    pub fn with_expected_eq_calls(&self, column: &str, n: usize) -> Table {
        self.map_adaptive_hints(|h| {
            h.expected_eq_calls.insert(column.into(), n);
        })
    }

    #[must_use]
    pub fn with_index_on(&self, column: &str) -> Table {
        self.map_adaptive_hints(|h| h.index_on.push(column.into()))
    }

    fn map_adaptive_hints(&self, f: impl FnOnce(&mut AdaptiveHints)) -> Table {
        match &*self.0 {
            Node::Adaptive(n) => {
                let mut hints = n.hints.clone();
                f(&mut hints);
                from_node(Node::Adaptive(AdaptiveNode {
                    base: n.base.clone(),
                    hints,
                    measurements: Arc::clone(&n.measurements),
                    limit: n.limit,
                    offset: n.offset,
                }))
            }
            _ => self.clone(),
        }
    }

    // -------------------------------------------------------------
    // Schema accessors
    // -------------------------------------------------------------

    #[must_use]
    pub fn columns_schema(&self) -> Schema {
        match &*self.0 {
            Node::Base(n) => n.storage.borrow().schema.clone(),
            Node::Generator(n) => n.schema.clone(),
            Node::Empty(n) => n.schema.clone(),
            Node::Filter(n) => n.child.columns_schema(),
            Node::Or(n) => n.child.columns_schema(),
            Node::Sort(n) => n.child.columns_schema(),
            Node::Barrier(n) => n.child.columns_schema(),
            Node::Project(n) => Schema::new(n.schema.visible().to_vec()),
            Node::Alias(n) => Schema::new(n.schema.visible().to_vec()),
            Node::Distinct(n) => n.child.columns_schema(),
            Node::Concat(n) => Schema::new(n.schema.visible().to_vec()),
            Node::Intersect(n) | Node::Except(n) => Schema::new(n.schema.visible().to_vec()),
            Node::Join(n) => Schema::new(n.schema.visible().to_vec()),
            Node::Semi(n) => n.outer.columns_schema(),
            Node::Adaptive(n) => n.base.columns_schema(),
        }
    }

    #[must_use]
    pub fn all_columns(&self) -> Schema {
        match &*self.0 {
            Node::Base(n) => n.storage.borrow().schema.clone(),
            Node::Generator(n) => n.schema.clone(),
            Node::Empty(n) => n.schema.clone(),
            Node::Filter(n) => n.child.all_columns(),
            Node::Or(n) => n.child.all_columns(),
            Node::Sort(n) => n.child.all_columns(),
            Node::Barrier(n) => n.child.all_columns(),
            Node::Project(n) => n.schema.clone(),
            Node::Alias(n) => n.schema.clone(),
            Node::Distinct(n) => n.child.all_columns(),
            Node::Concat(n) => n.schema.clone(),
            Node::Intersect(n) | Node::Except(n) => n.schema.clone(),
            Node::Join(n) => n.schema.clone(),
            Node::Semi(n) => n.outer.all_columns(),
            Node::Adaptive(n) => n.base.all_columns(),
        }
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit_offset().0
    }
    pub fn get_offset(&self) -> usize {
        self.limit_offset().1
    }

    // -------------------------------------------------------------
    // Executors
    // -------------------------------------------------------------

    /// Materializes a logical (pre-pagination) row stream for this
    /// operator alone, i.e. without applying its own `limit`/`offset` —
    /// every caller that needs the paginated stream goes through
    /// `iterate`, which calls this and then truncates once centrally.
    fn logical_rows(&self) -> Result<RowIter> {
        match &*self.0 {
            Node::Base(n) => self.iterate_base(n),
            Node::Generator(n) => {
                let produce = Arc::clone(&n.produce);
                let count = n.count;
                Ok(Box::new((0..count).map(move |i| (RowId(i), produce(i)))))
            }
            Node::Empty(_) => Ok(Box::new(std::iter::empty())),
            Node::Filter(n) => {
                n.clause.rhs_require_no_placeholder()?;
                let clause = n.clause.clone();
                let iter = n.child.iterate()?;
                Ok(Box::new(
                    iter.filter(move |(_, row)| crate::predicate::clause_matches(&clause, row)),
                ))
            }
            Node::Or(n) => {
                for p in &n.predicates {
                    p.require_bound()?;
                }
                let predicates = n.predicates.clone();
                let iter = n.child.iterate()?;
                Ok(Box::new(iter.filter(move |(_, row)| {
                    predicates.iter().any(|p| p.matches(row))
                })))
            }
            Node::Sort(n) => self.iterate_sort(n),
            Node::Barrier(n) => {
                let iter = n.child.iterate()?;
                let iter = iter.skip(n.enforce_offset);
                match n.enforce_limit {
                    Some(l) => Ok(Box::new(iter.take(l))),
                    None => Ok(Box::new(iter)),
                }
            }
            Node::Project(n) => {
                let names = n.schema.visible_names();
                let iter = n.child.iterate()?;
                Ok(Box::new(iter.map(move |(id, row)| (id, row.project(&names)))))
            }
            Node::Alias(n) => {
                let prefix = n.prefix.clone();
                let renames = n.renames.clone();
                let child_names: Vec<ColumnName> = n.child.all_columns().visible_names();
                let iter = n.child.iterate()?;
                Ok(Box::new(iter.map(move |(id, row)| {
                    let mut out = Row::new();
                    for name in &child_names {
                        if let Some(v) = row.get(name) {
                            let renamed = alias::rename_one(name, prefix.as_deref(), &renames);
                            out.set(renamed, v.clone());
                        }
                    }
                    (id, out)
                })))
            }
            Node::Distinct(n) => {
                let names = n.child.columns_schema().visible_names();
                let iter = n.child.iterate()?;
                let mut seen = HashSet::new();
                let rows: Vec<(RowId, Row)> = iter
                    .filter(move |(_, row)| seen.insert(row.identity_key(&names)))
                    .collect();
                Ok(Box::new(rows.into_iter()))
            }
            Node::Concat(n) => self.iterate_concat(n),
            Node::Intersect(n) => self.iterate_intersect(n),
            Node::Except(n) => self.iterate_except(n),
            Node::Join(n) => self.iterate_join(n),
            Node::Semi(n) => self.iterate_semi(n),
            Node::Adaptive(n) => n.base.logical_rows(),
        }
    }

    /// The public entry point: validates binding up front, then returns a
    /// fully paginated stream.
    pub fn iterate(&self) -> Result<RowIter> {
        let rows = self.logical_rows()?;
        let (limit, offset) = self.limit_offset();
        let skipped = rows.skip(offset);
        match limit {
            Some(l) => Ok(Box::new(skipped.take(l))),
            None => Ok(Box::new(skipped)),
        }
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.iterate()?.count())
    }

    pub fn load(&self, id: RowId) -> Result<Option<Row>> {
        Ok(self.iterate()?.find(|(rid, _)| *rid == id).map(|(_, r)| r))
    }

    /// Whole-row membership test (§4.8's probe-set use, §4.12's adaptive
    /// measurement target): true if some row in this operator's result
    /// matches `member` on every visible column `member` itself carries.
    pub fn has(&self, member: &Row) -> Result<bool> {
        if let Node::Adaptive(n) = &*self.0 {
            return self.adaptive_has(n, member);
        }
        let names: Vec<ColumnName> = member.iter().map(|(k, _)| k.clone()).collect();
        let target = member.identity_key(&names);
        for (_, row) in self.iterate()? {
            if row.identity_key(&names) == target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn adaptive_has(&self, n: &AdaptiveNode, member: &Row) -> Result<bool> {
        let names: Vec<ColumnName> = member.iter().map(|(k, _)| k.clone()).collect();
        let target = member.identity_key(&names);
        let Node::Base(base) = &*n.base.0 else {
            unreachable!("adaptive always wraps a base table");
        };
        let config = Arc::clone(&base.storage.borrow().config);
        if let Some(found) = self.row_index_lookup(base, member, &names) {
            return Ok(found);
        }
        let (found, elapsed) = adaptive::measure(|| {
            n.base
                .iterate()
                .map(|iter| iter.into_iter().any(|(_, row)| row.identity_key(&names) == target))
        });
        let found = found?;
        let should_index = n
            .measurements
            .borrow_mut()
            .record_has(elapsed, &config, &n.hints);
        if should_index {
            self.build_adaptive_row_index(n, &names);
        }
        Ok(found)
    }

    /// Whole-row index lookup for `adaptive_has`, once `build_adaptive_row_index`
    /// has built one over exactly `names`. `None` means no index exists yet,
    /// or an index was built for a differently-shaped probe, so the caller
    /// falls back to the measured linear scan either way.
    fn row_index_lookup(&self, base: &BaseNode, member: &Row, names: &[ColumnName]) -> Option<bool> {
        let storage = base.storage.borrow();
        let row_index = storage.row_index.as_ref()?;
        if storage.row_index_columns.as_slice() != names {
            return None;
        }
        let key = pack_row_key(member, names, storage.collator.as_ref());
        Some(!row_index.point_lookup(&key, storage.collator.as_ref()).is_empty())
    }

    /// Builds the whole-row membership index backing `adaptive_has` once
    /// `record_has` judges it worthwhile (§4.12), backfilling from every
    /// row currently stored, keyed on the probing row's own column set
    /// (mirrors `build_adaptive_index`'s per-column backfill).
    fn build_adaptive_row_index(&self, n: &AdaptiveNode, names: &[ColumnName]) {
        let Node::Base(base) = &*n.base.0 else {
            return;
        };
        let mut storage = base.storage.borrow_mut();
        if storage.row_index.is_some() {
            return;
        }
        let threshold = storage.config.adaptive_materialize_threshold;
        let mut index = Index::new(threshold);
        let entries: Vec<(u64, Scalar)> = storage
            .rows
            .iter()
            .map(|(id, row)| (*id, pack_row_key(row, names, storage.collator.as_ref())))
            .collect();
        for (id, key) in entries {
            index.insert(&key, RowId(id), storage.collator.as_ref());
        }
        storage.row_index_columns = names.to_vec();
        storage.row_index = Some(index);
    }

    // -------------------------------------------------------------
    // Base table iteration (index-aware)
    // -------------------------------------------------------------

    fn iterate_base(&self, n: &BaseNode) -> Result<RowIter> {
        let storage = n.storage.borrow();
        let mut candidate_ids: Option<HashSet<u64>> = None;
        let mut remaining_filters: Vec<Clause> = Vec::new();
        for clause in &n.filters {
            if let (CompareOp::Eq, Rhs::Value(v)) = (clause.op, &clause.rhs) {
                if let Some(index) = storage.indexes.get(&clause.column) {
                    let ids: HashSet<u64> = index
                        .point_lookup(v, storage.collator.as_ref())
                        .into_iter()
                        .map(|id| id.0)
                        .collect();
                    candidate_ids = Some(match candidate_ids {
                        Some(existing) => existing.intersection(&ids).copied().collect(),
                        None => ids,
                    });
                    continue;
                }
            }
            remaining_filters.push(clause.clone());
        }
        let base_ids: Vec<u64> = match candidate_ids {
            Some(ids) => {
                let mut ids: Vec<u64> = ids.into_iter().collect();
                ids.sort_unstable();
                ids
            }
            None => storage.rows.keys().copied().collect(),
        };
        let rows: Vec<(RowId, Row)> = base_ids
            .into_iter()
            .filter_map(|id| storage.rows.get(&id).map(|r| (RowId(id), r.clone())))
            .filter(|(_, row)| {
                remaining_filters
                    .iter()
                    .all(|c| crate::predicate::clause_matches(c, row))
            })
            .collect();
        Ok(Box::new(rows.into_iter()))
    }

    // -------------------------------------------------------------
    // Sort
    // -------------------------------------------------------------

    fn iterate_sort(&self, n: &SortNode) -> Result<RowIter> {
        let schema = n.child.all_columns();
        let cmp = RowComparator::build(&n.keys, &schema);
        let rows = n.child.iterate()?;
        let (limit, offset) = (n.limit, n.offset);
        let threshold = self.engine_config().heap_top_k_threshold;
        let out = match limit {
            Some(l) if offset.saturating_add(l) <= threshold => {
                sort::heap_top_k(rows, &cmp, offset + l, offset)
            }
            _ => sort::full_sort(rows, &cmp, 0, None),
        };
        Ok(Box::new(out.into_iter()))
    }

    fn engine_config(&self) -> Arc<EngineConfig> {
        match &*self.0 {
            Node::Base(n) => Arc::clone(&n.storage.borrow().config),
            Node::Generator(_) | Node::Empty(_) => Arc::new(EngineConfig::default()),
            Node::Filter(n) => n.child.engine_config(),
            Node::Or(n) => n.child.engine_config(),
            Node::Sort(n) => n.child.engine_config(),
            Node::Barrier(n) => n.child.engine_config(),
            Node::Project(n) => n.child.engine_config(),
            Node::Alias(n) => n.child.engine_config(),
            Node::Distinct(n) => n.child.engine_config(),
            Node::Concat(n) => n.left.engine_config(),
            Node::Intersect(n) | Node::Except(n) => n.left.engine_config(),
            Node::Join(n) => n.left.engine_config(),
            Node::Semi(n) => n.outer.engine_config(),
            Node::Adaptive(n) => n.base.engine_config(),
        }
    }

    // -------------------------------------------------------------
    // Set operations
    // -------------------------------------------------------------

    fn iterate_concat(&self, n: &ConcatNode) -> Result<RowIter> {
        let left_names = n.left.columns_schema().visible_names();
        let right_names = n.right.columns_schema().visible_names();
        let out_names = n.schema.visible_names();
        let left_iter = n.left.iterate()?;
        let out_names_left = out_names.clone();
        let left_mapped = left_iter.map(move |(id, row)| (id, remap_positional(&row, &left_names, &out_names_left)));
        let right_iter = n.right.iterate()?;
        let out_names_right = out_names;
        let right_mapped = right_iter.map(move |(id, row)| (id, remap_positional(&row, &right_names, &out_names_right)));
        Ok(Box::new(left_mapped.chain(right_mapped)))
    }

    fn iterate_intersect(&self, n: &SetOpNode) -> Result<RowIter> {
        let names = n.left.columns_schema().visible_names();
        let left_count = n.left.count().unwrap_or(usize::MAX);
        let right_count = n.right.count().unwrap_or(usize::MAX);
        let (probe, other) = if right_count < left_count {
            (&n.right, &n.left)
        } else {
            (&n.left, &n.right)
        };
        let mut probe_set: HashSet<_> = HashSet::new();
        for (_, row) in probe.iterate()? {
            probe_set.insert(row.identity_key(&names));
        }
        let rows: Vec<(RowId, Row)> = other
            .iterate()?
            .filter(|(_, row)| probe_set.contains(&row.identity_key(&names)))
            .collect();
        Ok(Box::new(rows.into_iter()))
    }

    fn iterate_except(&self, n: &SetOpNode) -> Result<RowIter> {
        let names = n.left.columns_schema().visible_names();
        let mut exclude: HashSet<_> = HashSet::new();
        for (_, row) in n.right.iterate()? {
            exclude.insert(row.identity_key(&names));
        }
        let rows: Vec<(RowId, Row)> = n
            .left
            .iterate()?
            .filter(|(_, row)| !exclude.contains(&row.identity_key(&names)))
            .collect();
        Ok(Box::new(rows.into_iter()))
    }

    // -------------------------------------------------------------
    // Joins
    // -------------------------------------------------------------

    fn iterate_join(&self, n: &JoinNode) -> Result<RowIter> {
        if matches!(n.kind, JoinKind::Cross) {
            return self.iterate_cross_join(n);
        }
        let left_schema = n.left.all_columns();
        let right_schema = n.right.all_columns();
        let use_sort_merge = join::has_usable_index(&left_schema, &right_schema, &n.equi);
        if use_sort_merge {
            self.iterate_sort_merge_join(n)
        } else {
            self.iterate_block_hash_join(n)
        }
    }

    fn iterate_cross_join(&self, n: &JoinNode) -> Result<RowIter> {
        let right_rows: Vec<(RowId, Row)> = n.right.iterate()?.collect();
        let left_rows: Vec<(RowId, Row)> = n.left.iterate()?.collect();
        let mut out = Vec::with_capacity(left_rows.len() * right_rows.len());
        for (lid, lrow) in &left_rows {
            for (rid, rrow) in &right_rows {
                out.push((join_id(*lid, *rid), lrow.merged_with(rrow)));
            }
        }
        Ok(Box::new(out.into_iter()))
    }

    fn iterate_block_hash_join(&self, n: &JoinNode) -> Result<RowIter> {
        let chunk_size = self.engine_config().hash_join_chunk_size;
        let left_rows: Vec<(RowId, Row)> = n.left.iterate()?.collect();
        let right_rows: Vec<(RowId, Row)> = n.right.iterate()?.collect();
        let equi = n.equi.clone();
        let kind = n.kind;
        let mut out = Vec::new();
        let mut right_matched: HashSet<RowId> = HashSet::new();
        for chunk in left_rows.chunks(chunk_size.max(1)) {
            let mut table: HashMap<RowKey, Vec<usize>> = HashMap::new();
            for (i, (_, row)) in chunk.iter().enumerate() {
                let key = equi_key(row, &equi, true);
                table.entry(key).or_default().push(i);
            }
            for (rid, rrow) in &right_rows {
                let key = equi_key(rrow, &equi, false);
                if let Some(idxs) = table.get(&key) {
                    for &i in idxs {
                        let (lid, lrow) = &chunk[i];
                        out.push((join_id(*lid, *rid), lrow.merged_with(rrow)));
                        right_matched.insert(*rid);
                    }
                }
            }
            if matches!(kind, JoinKind::Left | JoinKind::Full) {
                for (lid, lrow) in chunk {
                    let key = equi_key(lrow, &equi, true);
                    let matched_any = right_rows.iter().any(|(_, rrow)| equi_key(rrow, &equi, false) == key);
                    if !matched_any {
                        out.push((*lid, lrow.clone()));
                    }
                }
            }
        }
        if matches!(kind, JoinKind::Right | JoinKind::Full) {
            for (rid, rrow) in &right_rows {
                if !right_matched.contains(rid) {
                    out.push((*rid, rrow.clone()));
                }
            }
        }
        Ok(Box::new(out.into_iter()))
    }

    /// Genuine index-ordered merge join (§4.9): both sides are sorted by
    /// their half of the equi-join columns, then a merge cursor advances
    /// key by key, buffering each side's run of rows sharing the current
    /// key and emitting their cross product. `JoinKind::Left/Right/Full`
    /// emit the outer row as-is (no inner-side columns set, same as
    /// `iterate_block_hash_join`) the moment a run's key has no
    /// counterpart on the other side.
    fn iterate_sort_merge_join(&self, n: &JoinNode) -> Result<RowIter> {
        let left_schema = n.left.all_columns();
        let right_schema = n.right.all_columns();
        let left_cmp = RowComparator::build(
            &n.equi.iter().map(|(l, _)| OrderDef::asc(l.clone())).collect::<Vec<_>>(),
            &left_schema,
        );
        let right_cmp = RowComparator::build(
            &n.equi.iter().map(|(_, r)| OrderDef::asc(r.clone())).collect::<Vec<_>>(),
            &right_schema,
        );
        let mut left_rows: Vec<(RowId, Row)> = n.left.iterate()?.collect();
        let mut right_rows: Vec<(RowId, Row)> = n.right.iterate()?.collect();
        left_rows.sort_by(|a, b| left_cmp.compare(&a.1, &b.1));
        right_rows.sort_by(|a, b| right_cmp.compare(&a.1, &b.1));

        let mut out = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < left_rows.len() && j < right_rows.len() {
            let lkey: Vec<Scalar> = n
                .equi
                .iter()
                .map(|(l, _)| left_rows[i].1.get(l).cloned().unwrap_or(Scalar::Null))
                .collect();
            let rkey: Vec<Scalar> = n
                .equi
                .iter()
                .map(|(_, r)| right_rows[j].1.get(r).cloned().unwrap_or(Scalar::Null))
                .collect();
            match compare_key_vecs(&lkey, &rkey) {
                std::cmp::Ordering::Less => {
                    if matches!(n.kind, JoinKind::Left | JoinKind::Full) {
                        out.push((left_rows[i].0, left_rows[i].1.clone()));
                    }
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    if matches!(n.kind, JoinKind::Right | JoinKind::Full) {
                        out.push((right_rows[j].0, right_rows[j].1.clone()));
                    }
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    let left_run_end = (i..left_rows.len())
                        .find(|&k| {
                            let key: Vec<Scalar> = n
                                .equi
                                .iter()
                                .map(|(l, _)| left_rows[k].1.get(l).cloned().unwrap_or(Scalar::Null))
                                .collect();
                            compare_key_vecs(&key, &lkey) != std::cmp::Ordering::Equal
                        })
                        .unwrap_or(left_rows.len());
                    let right_run_end = (j..right_rows.len())
                        .find(|&k| {
                            let key: Vec<Scalar> = n
                                .equi
                                .iter()
                                .map(|(_, r)| right_rows[k].1.get(r).cloned().unwrap_or(Scalar::Null))
                                .collect();
                            compare_key_vecs(&key, &rkey) != std::cmp::Ordering::Equal
                        })
                        .unwrap_or(right_rows.len());
                    for (lid, lrow) in &left_rows[i..left_run_end] {
                        for (rid, rrow) in &right_rows[j..right_run_end] {
                            out.push((join_id(*lid, *rid), lrow.merged_with(rrow)));
                        }
                    }
                    i = left_run_end;
                    j = right_run_end;
                }
            }
        }
        if matches!(n.kind, JoinKind::Left | JoinKind::Full) {
            for (lid, lrow) in &left_rows[i..] {
                out.push((*lid, lrow.clone()));
            }
        }
        if matches!(n.kind, JoinKind::Right | JoinKind::Full) {
            for (rid, rrow) in &right_rows[j..] {
                out.push((*rid, rrow.clone()));
            }
        }
        Ok(Box::new(out.into_iter()))
    }

    // -------------------------------------------------------------
    // Exists / not-exists
    // -------------------------------------------------------------

    fn iterate_semi(&self, n: &SemiNode) -> Result<RowIter> {
        let correlations = n.correlations.clone();
        let inner_rows: Vec<Row> = n.inner.iterate()?.map(|(_, r)| r).collect();
        let negated = n.negated;
        let outer_iter = n.outer.iterate()?;
        let rows: Vec<(RowId, Row)> = outer_iter
            .filter(move |(_, outer_row)| {
                let matched = inner_rows.iter().any(|inner_row| {
                    correlations.iter().all(|(oc, ic)| {
                        let ov = outer_row.get(oc).cloned().unwrap_or(Scalar::Null);
                        let iv = inner_row.get(ic).cloned().unwrap_or(Scalar::Null);
                        ov.value_eq(&iv)
                    })
                });
                matched != negated
            })
            .collect();
        Ok(Box::new(rows.into_iter()))
    }

    // -------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------

    /// Turns this table into a `MutableTable`, the insert/update/delete
    /// handle (§4.1, §4.13). Requires `self` to be a bare base table (no
    /// filters applied yet) so inserts don't need to reason about which
    /// operators they'd need to satisfy.
    pub fn into_mutable(self) -> Result<MutableTable> {
        match &*self.0 {
            Node::Base(n) if n.filters.is_empty() => Ok(MutableTable {
                storage: Arc::clone(&n.storage),
                view: self,
            }),
            Node::Base(_) => Err(EngineError::foreign_view("filtered base table")),
            _ => Err(EngineError::foreign_view("non-base table")),
        }
    }

    /// Turns a filtered view of a base table into a `MutableTable` scoped
    /// to that view's `update`/`delete` target set. Errors if `self` isn't
    /// rooted in `origin`'s storage.
    pub fn into_mutable_view(self, origin: &Table) -> Result<MutableTable> {
        let Node::Base(origin_base) = &*origin.0 else {
            return Err(EngineError::foreign_view("origin is not a base table"));
        };
        if !self.shares_storage(&origin_base.storage) {
            return Err(EngineError::foreign_view("unrelated base table"));
        }
        Ok(MutableTable {
            storage: Arc::clone(&origin_base.storage),
            view: self,
        })
    }

    fn shares_storage(&self, storage: &Arc<RefCell<BaseStorage>>) -> bool {
        match &*self.0 {
            Node::Base(n) => Arc::ptr_eq(&n.storage, storage),
            Node::Filter(n) => n.child.shares_storage(storage),
            Node::Or(n) => n.child.shares_storage(storage),
            Node::Sort(n) => n.child.shares_storage(storage),
            Node::Barrier(n) => n.child.shares_storage(storage),
            Node::Project(n) => n.child.shares_storage(storage),
            Node::Alias(n) => n.child.shares_storage(storage),
            Node::Distinct(n) => n.child.shares_storage(storage),
            Node::Adaptive(n) => n.base.shares_storage(storage),
            _ => false,
        }
    }
}

fn join_id(l: RowId, r: RowId) -> RowId {
    RowId(l.0.wrapping_mul(1_000_003).wrapping_add(r.0))
}

/// Packs every one of `names`' values out of `row` into a single
/// byte-sortable key, used by the adaptive optimizer's whole-row `has`
/// index (§4.12): one `Scalar::Binary` entry per row rather than one
/// index per column.
fn pack_row_key(row: &Row, names: &[ColumnName], collator: &dyn Collator) -> Scalar {
    let mut bytes = Vec::new();
    for name in names {
        let value = row.get(name).cloned().unwrap_or(Scalar::Null);
        bytes.extend(crate::index::key::pack(&value, collator));
    }
    Scalar::Binary(bytes)
}

/// Lexicographic comparison of two equi-join key tuples, one scalar per
/// equi-condition column, using the same null/numeric/text ordering rules
/// `order.rs` applies to a single `ORDER BY` key.
fn compare_key_vecs(a: &[Scalar], b: &[Scalar]) -> std::cmp::Ordering {
    for (av, bv) in a.iter().zip(b.iter()) {
        let ord = crate::order::compare_nulls_first(av, bv);
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}

fn equi_key(row: &Row, equi: &[(ColumnName, ColumnName)], is_left: bool) -> RowKey {
    let values: Vec<Scalar> = equi
        .iter()
        .map(|(l, r)| {
            let col = if is_left { l } else { r };
            row.get(col).cloned().unwrap_or(Scalar::Null)
        })
        .collect();
    RowKey::from_values(values)
}

fn remap_positional(row: &Row, from_names: &[ColumnName], to_names: &[ColumnName]) -> Row {
    let mut out = Row::new();
    for (from, to) in from_names.iter().zip(to_names.iter()) {
        if let Some(v) = row.get(from) {
            out.set(to.clone(), v.clone());
        }
    }
    out
}

// ---------------------------------------------------------------------
// Mutation (§4.1, §4.13)
// ---------------------------------------------------------------------

/// A handle for inserting, updating, and deleting rows in a base table's
/// storage. `update`/`delete` operate over whatever rows `view` currently
/// selects (so `table.eq("dept", "Eng").into_mutable_view(&table)?.delete()`
/// deletes only matching rows); `insert` always targets the underlying
/// storage directly, independent of `view`'s filters.
pub struct MutableTable {
    storage: Arc<RefCell<BaseStorage>>,
    view: Table,
}

impl MutableTable {
    pub fn insert(&self, row: Row) -> Result<RowId> {
        self.storage.borrow_mut().insert_row(row)
    }

    /// Applies `assignments` to every row currently selected by this
    /// handle's view, returning the number of rows updated.
    pub fn update(&self, assignments: &[Assignment]) -> Result<usize> {
        let ids: Vec<RowId> = self.view.iterate()?.map(|(id, _)| id).collect();
        let mut count = 0;
        for id in ids {
            if self.storage.borrow_mut().update_row(id, assignments)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Deletes every row currently selected by this handle's view,
    /// returning the number of rows deleted.
    pub fn delete(&self) -> Result<usize> {
        let ids: Vec<RowId> = self.view.iterate()?.map(|(id, _)| id).collect();
        let mut count = 0;
        for id in ids {
            if self.storage.borrow_mut().delete_row(id) {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl Clause {
    fn rhs_require_no_placeholder(&self) -> Result<()> {
        if matches!(self.rhs, Rhs::Placeholder(_)) {
            Err(EngineError::unbound_placeholders(&[self.column.to_string()]))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn users_schema() -> Schema {
        Schema::new(vec![
            ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
            ColumnDescriptor::new("name", ColumnType::Text),
            ColumnDescriptor::new("dept", ColumnType::Text).with_index_hint(IndexHint::Index),
            ColumnDescriptor::new("age", ColumnType::Int),
        ])
    }

    fn sample_users() -> Table {
        let rows = (1..=10)
            .map(|i| {
                Row::new()
                    .with("id", Scalar::Int(i))
                    .with("name", Scalar::Text(format!("user{i}")))
                    .with("dept", Scalar::Text(if i % 2 == 0 { "Eng".into() } else { "Sales".into() }))
                    .with("age", Scalar::Int(20 + i))
            })
            .collect();
        Table::base_with_rows(users_schema(), rows).unwrap()
    }

    #[test]
    fn eq_filter_returns_matching_rows() {
        let t = sample_users();
        let filtered = t.eq("dept", "Eng").unwrap();
        assert_eq!(filtered.count().unwrap(), 5);
    }

    #[test]
    fn chained_same_column_filter_proves_empty() {
        let t = sample_users();
        let filtered = t.gt("age", 40).unwrap().lt("age", 20).unwrap();
        assert_eq!(filtered.count().unwrap(), 0);
        assert!(matches!(&*filtered.0, Node::Empty(_)));
    }

    #[test]
    fn eq_then_contradicting_eq_is_empty() {
        let t = sample_users();
        let filtered = t.eq("id", 1).unwrap().eq("id", 2).unwrap();
        assert_eq!(filtered.count().unwrap(), 0);
    }

    #[test]
    fn limit_and_offset_paginate() {
        let t = sample_users();
        let page = t.order(vec![OrderDef::asc("id")]).limit(3).offset(2);
        let ids: Vec<i64> = page
            .iterate()
            .unwrap()
            .map(|(_, r)| match r.get("id") {
                Some(Scalar::Int(i)) => *i,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn barrier_prevents_window_widening() {
        let t = sample_users();
        let page = t
            .order(vec![OrderDef::asc("id")])
            .limit(3)
            .barrier()
            .eq("dept", "Eng")
            .unwrap();
        // The underlying window is rows 1..=3 (ids 1,2,3); only id=2 is Eng.
        assert_eq!(page.count().unwrap(), 1);
    }

    #[test]
    fn projection_narrows_but_keeps_hidden_filterable() {
        let t = sample_users();
        let projected = t.columns(&["name"]).unwrap().eq("age", 21).unwrap();
        let rows: Vec<_> = projected.iterate().unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].1.get("age").is_none());
        assert_eq!(rows[0].1.get("name"), Some(&Scalar::Text("user1".into())));
    }

    #[test]
    fn distinct_dedups_after_projection() {
        let t = sample_users();
        let depts = t.columns(&["dept"]).unwrap().distinct();
        assert_eq!(depts.count().unwrap(), 2);
    }

    #[test]
    fn union_is_distinct_concat_left_wins() {
        let eng = sample_users().eq("dept", "Eng").unwrap().columns(&["id"]).unwrap();
        let all = sample_users().columns(&["id"]).unwrap();
        let u = eng.union(&all).unwrap();
        assert_eq!(u.count().unwrap(), 10);
    }

    #[test]
    fn inner_join_matches_on_equi_condition() {
        let depts = Table::base_with_rows(
            Schema::new(vec![
                ColumnDescriptor::new("dept_name", ColumnType::Text).with_index_hint(IndexHint::Unique),
                ColumnDescriptor::new("budget", ColumnType::Int),
            ]),
            vec![
                Row::new().with("dept_name", Scalar::Text("Eng".into())).with("budget", Scalar::Int(100)),
                Row::new().with("dept_name", Scalar::Text("Sales".into())).with("budget", Scalar::Int(50)),
            ],
        )
        .unwrap();
        let users = sample_users();
        let joined = users
            .join_inner(&depts, vec![("dept".into(), "dept_name".into())])
            .unwrap();
        assert_eq!(joined.count().unwrap(), 10);
    }

    #[test]
    fn exists_filters_to_correlated_matches() {
        let orders = Table::base_with_rows(
            Schema::new(vec![ColumnDescriptor::new("user_id", ColumnType::Int)]),
            vec![
                Row::new().with("user_id", Scalar::Int(1)),
                Row::new().with("user_id", Scalar::Int(2)),
            ],
        )
        .unwrap();
        let users = sample_users();
        let with_orders = users.exists(&orders, vec![("id".into(), "user_id".into())]);
        assert_eq!(with_orders.count().unwrap(), 2);
        let without_orders = users.not_exists(&orders, vec![("id".into(), "user_id".into())]);
        assert_eq!(without_orders.count().unwrap(), 8);
    }

    #[test]
    fn mutable_insert_then_query() {
        let t = Table::base(users_schema());
        let mutable = t.clone().into_mutable().unwrap();
        mutable
            .insert(
                Row::new()
                    .with("id", Scalar::Int(1))
                    .with("name", Scalar::Text("a".into()))
                    .with("dept", Scalar::Text("Eng".into()))
                    .with("age", Scalar::Int(30)),
            )
            .unwrap();
        assert_eq!(t.count().unwrap(), 1);
    }

    #[test]
    fn mutable_insert_duplicate_primary_key_errors() {
        let t = Table::base(users_schema());
        let mutable = t.clone().into_mutable().unwrap();
        let make_row = |id| {
            Row::new()
                .with("id", Scalar::Int(id))
                .with("name", Scalar::Text("a".into()))
                .with("dept", Scalar::Text("Eng".into()))
                .with("age", Scalar::Int(30))
        };
        mutable.insert(make_row(1)).unwrap();
        assert!(mutable.insert(make_row(1)).is_err());
    }

    #[test]
    fn mutable_view_update_only_touches_selected_rows() {
        let t = sample_users();
        let eng_view = t.clone().eq("dept", "Eng").unwrap();
        let mutable = eng_view.into_mutable_view(&t).unwrap();
        let updated = mutable
            .update(&[Assignment::new("age", 99)])
            .unwrap();
        assert_eq!(updated, 5);
        assert_eq!(t.eq("age", 99).unwrap().count().unwrap(), 5);
    }

    #[test]
    fn mutable_view_delete_removes_selected_rows() {
        let t = sample_users();
        let sales_view = t.clone().eq("dept", "Sales").unwrap();
        let mutable = sales_view.into_mutable_view(&t).unwrap();
        assert_eq!(mutable.delete().unwrap(), 5);
        assert_eq!(t.count().unwrap(), 5);
    }

    #[test]
    fn adaptive_requires_base_table() {
        let t = sample_users();
        let filtered = t.eq("dept", "Eng").unwrap();
        assert!(filtered.adaptive().is_err());
    }

    #[test]
    fn adaptive_wraps_base_and_still_queries() {
        let t = sample_users().adaptive().unwrap().with_expected_eq_calls("dept", 100);
        for _ in 0..5 {
            assert_eq!(t.eq("dept", "Eng").unwrap().count().unwrap(), 5);
        }
    }

    #[test]
    fn or_matches_any_predicate() {
        let t = sample_users();
        let matched = t.or(vec![
            Predicate::new().eq("dept", "Eng"),
            Predicate::new().eq("id", 1),
        ]);
        assert_eq!(matched.count().unwrap(), 6);
    }

    #[test]
    fn plain_limit_freezes_window_without_explicit_barrier() {
        let t = sample_users();
        let page = t
            .order(vec![OrderDef::asc("id")])
            .limit(3)
            .eq("dept", "Eng")
            .unwrap();
        // Same frozen first-three window as `barrier_prevents_window_widening`,
        // reached with no explicit `.barrier()` call: the limit already on
        // `t.order(...).limit(3)` is a frozen window the later `eq` wraps on
        // top of instead of pushing through (§4.6).
        assert_eq!(page.count().unwrap(), 1);
    }

    #[test]
    fn filter_on_sorted_node_keeps_its_own_pagination_too() {
        let t = sample_users();
        let narrowed = t
            .order(vec![OrderDef::asc("age")])
            .limit(4)
            .lt("age", 24)
            .unwrap()
            .eq("dept", "Eng")
            .unwrap();
        // ages 21..24 (ids 1..4) are the frozen window; lt(24) keeps 21..23
        // (ids 1..3), and only id=2 is Eng.
        assert_eq!(narrowed.count().unwrap(), 1);
    }

    #[test]
    fn left_join_with_indexed_side_uses_sort_merge_and_keeps_unmatched() {
        let depts = Table::base_with_rows(
            Schema::new(vec![
                ColumnDescriptor::new("dept_name", ColumnType::Text).with_index_hint(IndexHint::Unique),
                ColumnDescriptor::new("budget", ColumnType::Int),
            ]),
            vec![Row::new()
                .with("dept_name", Scalar::Text("Eng".into()))
                .with("budget", Scalar::Int(100))],
        )
        .unwrap();
        let users = sample_users();
        assert!(join::has_usable_index(
            &users.all_columns(),
            &depts.all_columns(),
            &[("dept".into(), "dept_name".into())],
        ));
        let joined = users
            .join_left(&depts, vec![("dept".into(), "dept_name".into())])
            .unwrap();
        // 5 Eng rows match the single Eng dept row; 5 Sales rows survive
        // unmatched, since this is a left join.
        assert_eq!(joined.count().unwrap(), 10);
        let matched_budgets: usize = joined
            .iterate()
            .unwrap()
            .filter(|(_, row)| row.get("budget").is_some_and(|v| !v.is_null()))
            .count();
        assert_eq!(matched_budgets, 5);
    }

    #[test]
    fn full_join_with_indexed_side_keeps_both_unmatched_sides() {
        let depts = Table::base_with_rows(
            Schema::new(vec![
                ColumnDescriptor::new("dept_name", ColumnType::Text).with_index_hint(IndexHint::Unique),
                ColumnDescriptor::new("budget", ColumnType::Int),
            ]),
            vec![
                Row::new().with("dept_name", Scalar::Text("Eng".into())).with("budget", Scalar::Int(100)),
                Row::new().with("dept_name", Scalar::Text("Marketing".into())).with("budget", Scalar::Int(10)),
            ],
        )
        .unwrap();
        let users = sample_users();
        let joined = users
            .join_full(&depts, vec![("dept".into(), "dept_name".into())])
            .unwrap();
        // 5 Eng matches + 5 unmatched Sales users + 1 unmatched Marketing dept.
        assert_eq!(joined.count().unwrap(), 11);
    }

    #[test]
    fn adaptive_has_builds_row_index_and_stays_correct() {
        let t = sample_users().adaptive().unwrap().with_expected_has_calls(1000);
        let present = Row::new().with("id", Scalar::Int(3));
        let absent = Row::new().with("id", Scalar::Int(999));
        for _ in 0..6 {
            assert!(t.has(&present).unwrap());
            assert!(!t.has(&absent).unwrap());
        }
    }
}
