//! The open-record row type: an unordered mapping from field name to
//! scalar. Rows are immutable within a single pipeline traversal;
//! operators produce new `Row` values rather than mutating one in place.

use crate::schema::ColumnName;
use crate::value::Scalar;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier yielded alongside a row within a single iteration.
/// Stable only for the lifetime of that iterator (§3 "Row-id stability").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

/// A row: field name → scalar, backed by a `BTreeMap` so iteration order
/// (and therefore any hash/identity key built from "all visible columns")
/// is deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(BTreeMap<ColumnName, Scalar>);

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.0
            .get(column)
            .or_else(|| self.get_unqualified(column))
    }

    fn get_unqualified(&self, column: &str) -> Option<&Scalar> {
        if column.contains('.') {
            return None;
        }
        self.0
            .iter()
            .find(|(name, _)| name.rsplit_once('.').is_some_and(|(_, c)| c == column))
            .map(|(_, v)| v)
    }

    pub fn set(&mut self, column: impl Into<ColumnName>, value: Scalar) {
        self.0.insert(column.into(), value);
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<ColumnName>, value: Scalar) -> Self {
        self.set(column, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnName, &Scalar)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Projects down to `names`, in order, renaming fields that don't
    /// already match via `rename`.
    #[must_use]
    pub fn project(&self, names: &[ColumnName]) -> Self {
        let mut out = Self::new();
        for name in names {
            if let Some(v) = self.get(name) {
                out.set(name.clone(), v.clone());
            }
        }
        out
    }

    /// Merges `other`'s fields into a clone of `self`; used by joins to
    /// combine matched rows from both sides. Caller is expected to have
    /// already verified there's no name overlap.
    #[must_use]
    pub fn merged_with(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.set(k.clone(), v.clone());
        }
        out
    }

    /// A row-identity key built from the fields named in `names`, for
    /// `Distinct` dedup and join-probe identity.
    #[must_use]
    pub fn identity_key(&self, names: &[ColumnName]) -> RowKey {
        RowKey(
            names
                .iter()
                .map(|n| self.get(n).cloned().unwrap_or(Scalar::Null))
                .collect(),
        )
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

/// A hashable/orderable snapshot of a row's values over a fixed column
/// list, used to de-duplicate or probe membership without re-walking the
/// whole row on every comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey(Vec<Scalar>);

impl RowKey {
    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.0
    }

    /// Builds a key directly from a positional value list, used by joins
    /// to key on one side's equi-condition columns without going through
    /// a full `Row`.
    #[must_use]
    pub(crate) fn from_values(values: Vec<Scalar>) -> Self {
        Self(values)
    }
}

impl Eq for RowKey {}

impl std::hash::Hash for RowKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for v in &self.0 {
            scalar_hash(v, state);
        }
    }
}

fn scalar_hash<H: std::hash::Hasher>(v: &Scalar, state: &mut H) {
    use std::hash::Hash;
    match v {
        Scalar::Null => 0u8.hash(state),
        Scalar::Int(i) => {
            1u8.hash(state);
            i.hash(state);
        }
        Scalar::Float(f) => {
            1u8.hash(state);
            // Hash the bit pattern of the nearest integral value when exact,
            // otherwise the raw bits — numeric equality (int==float) only
            // needs to coincide for the common whole-number case; a false
            // negative here only costs a redundant probe, never correctness,
            // because the hash bucket membership always falls back to
            // `Scalar::value_eq` for the final comparison.
            if f.fract() == 0.0 && f.is_finite() {
                (*f as i64).hash(state);
            } else {
                f.to_bits().hash(state);
            }
        }
        Scalar::Decimal(d) => {
            1u8.hash(state);
            d.to_string().hash(state);
        }
        Scalar::Text(s) => s.hash(state),
        Scalar::Binary(b) => b.hash(state),
        Scalar::Date(d) => d.hash(state),
        Scalar::Time(t) => t.hash(state),
        Scalar::DateTime(dt) => dt.hash(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_equal_for_equal_values() {
        let a = Row::new().with("id", Scalar::Int(1));
        let b = Row::new().with("id", Scalar::Int(1));
        assert_eq!(
            a.identity_key(&["id".into()]),
            b.identity_key(&["id".into()])
        );
    }

    #[test]
    fn merged_with_combines_fields() {
        let a = Row::new().with("id", Scalar::Int(1));
        let b = Row::new().with("name", Scalar::Text("x".into()));
        let m = a.merged_with(&b);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn unqualified_lookup_finds_aliased_field() {
        let r = Row::new().with("u.id", Scalar::Int(7));
        assert_eq!(r.get("id"), Some(&Scalar::Int(7)));
    }
}
