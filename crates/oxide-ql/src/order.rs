//! Ordering specifications and the per-key comparator they compile to.

use crate::collation::{Collator, DefaultCollator};
use crate::row::Row;
use crate::schema::{ColumnName, ColumnType, Schema};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDef {
    pub column: ColumnName,
    pub direction: OrderDirection,
}

impl OrderDef {
    #[must_use]
    pub fn asc(column: impl Into<ColumnName>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: impl Into<ColumnName>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// A comparator built once from an `OrderDef` list and a schema, so each
/// key's "numeric vs. locale vs. byte" comparison rule is resolved up
/// front rather than re-dispatched on every pair of rows.
pub struct RowComparator {
    keys: Vec<(ColumnName, OrderDirection, bool)>, // bool = uses_locale_collator
    collator: Arc<dyn Collator>,
}

impl RowComparator {
    #[must_use]
    pub fn build(defs: &[OrderDef], schema: &Schema) -> Self {
        Self::build_with_collator(defs, schema, Arc::new(DefaultCollator))
    }

    #[must_use]
    pub fn build_with_collator(
        defs: &[OrderDef],
        schema: &Schema,
        collator: Arc<dyn Collator>,
    ) -> Self {
        let keys = defs
            .iter()
            .map(|d| {
                let uses_locale = schema
                    .find(&d.column)
                    .map(|c| c.ty.uses_locale_collator())
                    .unwrap_or(false);
                (d.column.clone(), d.direction, uses_locale)
            })
            .collect();
        Self { keys, collator }
    }

    #[must_use]
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        for (col, dir, uses_locale) in &self.keys {
            let ord = self.compare_key(a, b, col, *uses_locale);
            let ord = match dir {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn compare_key(&self, a: &Row, b: &Row, col: &str, uses_locale: bool) -> Ordering {
        let (av, bv) = (a.get(col), b.get(col));
        match (av, bv) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(av), Some(bv)) => {
                if uses_locale {
                    match (av, bv) {
                        (crate::value::Scalar::Text(a), crate::value::Scalar::Text(b)) => {
                            self.collator.compare(a, b)
                        }
                        _ => compare_nulls_first(av, bv),
                    }
                } else {
                    compare_nulls_first(av, bv)
                }
            }
        }
    }
}

/// Sort-position rule for nulls and non-numeric types: numeric three-way
/// when either side is numeric or null (nulls sort first), byte comparison
/// otherwise. Unlike filter predicates, ordering must produce a total
/// order, so null is placed rather than excluded.
pub(crate) fn compare_nulls_first(a: &crate::value::Scalar, b: &crate::value::Scalar) -> Ordering {
    use crate::value::Scalar;
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    if a.is_numeric() || b.is_numeric() {
        if let Some(ord) = a.partial_order(b) {
            return ord;
        }
    }
    match (a, b) {
        (Scalar::Binary(a), Scalar::Binary(b)) => a.cmp(b),
        (Scalar::Text(a), Scalar::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
        _ => a.partial_order(b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;
    use crate::value::Scalar;

    #[test]
    fn sorts_by_single_numeric_key_desc() {
        let schema = Schema::new(vec![ColumnDescriptor::new("age", ColumnType::Int)]);
        let cmp = RowComparator::build(&[OrderDef::desc("age")], &schema);
        let a = Row::new().with("age", Scalar::Int(10));
        let b = Row::new().with("age", Scalar::Int(20));
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn multi_key_breaks_ties() {
        let schema = Schema::new(vec![
            ColumnDescriptor::new("dept", ColumnType::Text),
            ColumnDescriptor::new("age", ColumnType::Int),
        ]);
        let cmp = RowComparator::build(
            &[OrderDef::asc("dept"), OrderDef::desc("age")],
            &schema,
        );
        let a = Row::new()
            .with("dept", Scalar::Text("eng".into()))
            .with("age", Scalar::Int(30));
        let b = Row::new()
            .with("dept", Scalar::Text("eng".into()))
            .with("age", Scalar::Int(20));
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }
}
