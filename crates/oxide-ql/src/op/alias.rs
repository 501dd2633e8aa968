//! The alias operator (§4.11): attaches a table-prefix and/or per-column
//! renames so two copies of the same table (or two joined tables with
//! colliding column names) can be told apart. Re-aliasing an already
//! aliased table replaces the prefix and merges column renames rather than
//! nesting indefinitely, so repeated `.with_alias()` calls don't build an
//! ever-growing chain of passthrough wrappers.

use crate::schema::{ColumnName, Schema};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AliasNode {
    pub child: crate::table::Table,
    pub prefix: Option<Arc<str>>,
    pub renames: BTreeMap<ColumnName, ColumnName>,
    pub schema: Schema,
    pub limit: Option<usize>,
    pub offset: usize,
}

use std::sync::Arc;

/// Computes the renamed column name for an original column, applying an
/// explicit per-column rename first and falling back to prefixing with the
/// table alias.
#[must_use]
pub fn rename_one(
    original: &ColumnName,
    prefix: Option<&str>,
    renames: &BTreeMap<ColumnName, ColumnName>,
) -> ColumnName {
    if let Some(renamed) = renames.get(original) {
        return renamed.clone();
    }
    let bare = original.rsplit_once('.').map_or(&**original, |(_, c)| c);
    match prefix {
        Some(p) => format!("{p}.{bare}").into(),
        None => bare.into(),
    }
}
