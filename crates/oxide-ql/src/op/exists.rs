//! `EXISTS`/`NOT EXISTS` (§4.10): a semi/anti-join that never adds columns
//! from the inner table, only filters the outer one by correlation.

use crate::schema::ColumnName;

#[derive(Debug, Clone)]
pub struct SemiNode {
    pub outer: crate::table::Table,
    pub inner: crate::table::Table,
    /// `(outer_column, inner_column)` equality correlations.
    pub correlations: Vec<(ColumnName, ColumnName)>,
    pub negated: bool,
    pub limit: Option<usize>,
    pub offset: usize,
}
