//! The empty table: a schema with a proof that zero rows can ever satisfy
//! it. Produced either directly (`Table::empty`) or by the filter rewrite
//! algebra proving a contradiction at construction time (§4.3).

use crate::schema::Schema;

#[derive(Debug, Clone)]
pub struct EmptyNode {
    pub schema: Schema,
}
