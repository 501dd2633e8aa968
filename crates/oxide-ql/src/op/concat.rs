//! `UNION ALL` (§4.8): concatenates two same-arity tables positionally —
//! the right side's rows are remapped onto the left side's column names by
//! position, not by name, matching the spec's positional `UnionTable`
//! resolution (§9). `union()` is sugar for `Distinct(Concat(...))`.

use crate::schema::Schema;

#[derive(Debug, Clone)]
pub struct ConcatNode {
    pub left: crate::table::Table,
    pub right: crate::table::Table,
    pub schema: Schema,
    pub limit: Option<usize>,
    pub offset: usize,
}
