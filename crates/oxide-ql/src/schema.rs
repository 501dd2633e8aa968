//! Column descriptors and the schema (ordered column list) every operator
//! reports via `columns()`/`all_columns()`.

use std::sync::Arc;

/// A column's declared scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Decimal(u32),
    Text,
    Binary,
    Date,
    Time,
    DateTime,
}

impl ColumnType {
    /// Drives `==` coercion and ordering: true for `Int`, `Float`, `Decimal`.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Decimal(_))
    }

    /// Text columns sort through the locale collator; everything else
    /// sorts by its own type-specific rule.
    #[must_use]
    pub fn uses_locale_collator(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// How a column's index participates in push-down strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexHint {
    None,
    Index,
    Unique,
    Primary,
}

impl IndexHint {
    /// Primary, unique, and plain indexes are all usable for point/range
    /// lookups; only `None` disqualifies a column from indexed strategies.
    #[must_use]
    pub fn is_indexed(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A cheaply-clonable, interned column name. Names carry alias prefixes
/// (`"u.id"`) when produced by the alias operator.
pub type ColumnName = Arc<str>;

/// `(name, type, index_hint, index_group)` as specified in §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: ColumnName,
    pub ty: ColumnType,
    pub index_hint: IndexHint,
    /// Columns sharing the same group participate in the same composite
    /// index; `None` means the column (if indexed at all) has its own.
    pub index_group: Option<u32>,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<ColumnName>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            index_hint: IndexHint::None,
            index_group: None,
        }
    }

    #[must_use]
    pub fn with_index_hint(mut self, hint: IndexHint) -> Self {
        self.index_hint = hint;
        self
    }

    #[must_use]
    pub fn with_index_group(mut self, group: u32) -> Self {
        self.index_group = Some(group);
        self
    }
}

/// An ordered list of column descriptors, with a visible/full split:
/// `visible` is what `columns()` returns to a consumer, `hidden` holds
/// columns that remain filterable/orderable after a narrowing projection
/// but are no longer surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    visible: Vec<ColumnDescriptor>,
    hidden: Vec<ColumnDescriptor>,
}

impl Schema {
    #[must_use]
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            visible: columns,
            hidden: Vec::new(),
        }
    }

    /// The visible projection, in declared order.
    #[must_use]
    pub fn visible(&self) -> &[ColumnDescriptor] {
        &self.visible
    }

    /// The full schema: visible columns followed by hidden-but-filterable
    /// ones, as consulted internally by filter/order/has.
    #[must_use]
    pub fn all(&self) -> Vec<&ColumnDescriptor> {
        self.visible.iter().chain(self.hidden.iter()).collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.visible
            .iter()
            .chain(self.hidden.iter())
            .find(|c| &*c.name == name || matches_unqualified(&c.name, name))
    }

    #[must_use]
    pub fn find_visible(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.visible
            .iter()
            .find(|c| &*c.name == name || matches_unqualified(&c.name, name))
    }

    /// Narrows the visible set to `names`, moving everything dropped into
    /// `hidden` so it remains reachable by filter/order/has. Errors if a
    /// name isn't present at all (widening is rejected by the caller, not
    /// here — this only ever narrows what's already visible).
    pub fn project(&self, names: &[&str]) -> crate::error::Result<Self> {
        let mut visible = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .find_visible(name)
                .ok_or_else(|| crate::error::EngineError::unknown_column(name))?
                .clone();
            visible.push(col);
        }
        let mut hidden = self.hidden.clone();
        hidden.extend(
            self.visible
                .iter()
                .filter(|c| !names.contains(&&*c.name))
                .cloned(),
        );
        Ok(Self { visible, hidden })
    }

    #[must_use]
    pub fn visible_names(&self) -> Vec<ColumnName> {
        self.visible.iter().map(|c| c.name.clone()).collect()
    }

    /// Renames every column (visible and hidden) through `f`, used by the
    /// alias operator.
    #[must_use]
    pub fn map_names(&self, f: impl Fn(&ColumnName) -> ColumnName) -> Self {
        let map = |c: &ColumnDescriptor| ColumnDescriptor {
            name: f(&c.name),
            ..c.clone()
        };
        Self {
            visible: self.visible.iter().map(map).collect(),
            hidden: self.hidden.iter().map(map).collect(),
        }
    }
}

fn matches_unqualified(qualified: &str, query: &str) -> bool {
    !query.contains('.')
        && qualified
            .rsplit_once('.')
            .is_some_and(|(_, col)| col == query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
            ColumnDescriptor::new("name", ColumnType::Text),
            ColumnDescriptor::new("dept", ColumnType::Text),
        ])
    }

    #[test]
    fn project_narrows_and_hides() {
        let s = schema();
        let p = s.project(&["name"]).unwrap();
        assert_eq!(p.visible_names().len(), 1);
        assert!(p.find("dept").is_some());
        assert!(p.find_visible("dept").is_none());
    }

    #[test]
    fn project_unknown_column_errors() {
        let s = schema();
        assert!(s.project(&["nope"]).is_err());
    }

    #[test]
    fn unqualified_name_matches_aliased_column() {
        let s = Schema::new(vec![ColumnDescriptor::new("u.id", ColumnType::Int)]);
        assert!(s.find("id").is_some());
    }
}
