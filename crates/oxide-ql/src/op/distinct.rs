//! Row de-duplication over the full visible column set.

#[derive(Debug, Clone)]
pub struct DistinctNode {
    pub child: crate::table::Table,
    pub limit: Option<usize>,
    pub offset: usize,
}
