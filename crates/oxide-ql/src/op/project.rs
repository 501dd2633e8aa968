//! The projection operator (§4.7): narrows the visible column set. Never
//! widens — columns dropped from view remain reachable by filter/order/has
//! through the child's full schema (`Schema::project` moves them to
//! `hidden` rather than discarding them), which is what lets
//! `t.columns(["name"]).eq("age", 30)` keep working.

use crate::schema::Schema;

#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub child: crate::table::Table,
    pub schema: Schema,
    pub limit: Option<usize>,
    pub offset: usize,
}
