//! `INTERSECT` and `EXCEPT` (§4.8): both probe one side's row keys against
//! a hash set built from the other. Intersect picks whichever side is
//! cheaper to build the probe set from (smaller `count()`, or an indexed
//! side) and swaps accordingly; except must always probe the right side
//! (subtraction isn't commutative) so there's nothing to swap.

use crate::schema::Schema;

#[derive(Debug, Clone)]
pub struct SetOpNode {
    pub left: crate::table::Table,
    pub right: crate::table::Table,
    pub schema: Schema,
    pub limit: Option<usize>,
    pub offset: usize,
}
