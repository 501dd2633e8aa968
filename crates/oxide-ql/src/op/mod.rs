//! Operator node data types (§4). Each module owns one operator's fields
//! and any algorithm private to it (rewrite tables, join strategies, the
//! adaptive measurement state machine); [`crate::table`] owns the dispatch
//! that ties them into the `Table` contract.

pub mod adaptive;
pub mod alias;
pub mod barrier;
pub mod concat;
pub mod distinct;
pub mod empty;
pub mod exists;
pub mod filter;
pub mod generator;
pub mod join;
pub mod or_filter;
pub mod project;
pub mod setops;
pub mod sort;
