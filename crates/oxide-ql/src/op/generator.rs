//! A procedurally generated base-like table: rows are produced by a
//! closure over an index rather than stored, useful for fixtures and
//! synthetic test data that doesn't need mutation or indexing.

use crate::row::Row;
use crate::schema::Schema;
use std::sync::Arc;

pub struct GeneratorNode {
    pub schema: Schema,
    pub count: u64,
    pub produce: Arc<dyn Fn(u64) -> Row + Send + Sync>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl std::fmt::Debug for GeneratorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorNode")
            .field("schema", &self.schema)
            .field("count", &self.count)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl Clone for GeneratorNode {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            count: self.count,
            produce: Arc::clone(&self.produce),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
