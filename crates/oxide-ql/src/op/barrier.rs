//! The barrier operator (§4.6): freezes a paginated result so later
//! filter/order/paginate calls built on top of it cannot push through to
//! the child and silently widen the window the barrier was meant to fix.
//!
//! A barrier always reports `get_limit() == None` and `get_offset() == 0`
//! to its parent — that's the mechanism that forces every wrapping
//! operator built afterwards to treat the barrier as an opaque, already-
//! paginated source rather than something whose pagination can be merged
//! with its own.

#[derive(Debug, Clone)]
pub struct BarrierNode {
    pub child: crate::table::Table,
    pub enforce_limit: Option<usize>,
    pub enforce_offset: usize,
}
