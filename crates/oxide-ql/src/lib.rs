//! # oxide-ql
//!
//! A lazy, composable, in-process relational query engine. A tree of table
//! operators accepts filters, projections, ordering, pagination, joins, and
//! set operations through a fluent builder interface and streams rows only
//! when a consumer actually iterates.
//!
//! ```
//! use oxide_ql::row::Row;
//! use oxide_ql::schema::{ColumnDescriptor, ColumnType, IndexHint, Schema};
//! use oxide_ql::table::Table;
//! use oxide_ql::value::Scalar;
//!
//! let schema = Schema::new(vec![
//!     ColumnDescriptor::new("id", ColumnType::Int).with_index_hint(IndexHint::Primary),
//!     ColumnDescriptor::new("dept", ColumnType::Text).with_index_hint(IndexHint::Index),
//! ]);
//! let users = Table::base_with_rows(
//!     schema,
//!     vec![
//!         Row::new().with("id", Scalar::Int(1)).with("dept", Scalar::Text("Eng".into())),
//!         Row::new().with("id", Scalar::Int(2)).with("dept", Scalar::Text("Sales".into())),
//!     ],
//! )
//! .unwrap();
//! let eng = users.eq("dept", "Eng").unwrap();
//! assert_eq!(eng.count().unwrap(), 1);
//! ```
//!
//! The crate is organized in three layers, as described in the design
//! document: contracts (`table`), operator nodes (`op`, dispatched from
//! `table::Table`), and support types (`value`, `row`, `schema`,
//! `predicate`, `order`, `collation`, `index`). `ast`/`compile` describe the
//! shape of a statement an upstream SQL parser would hand this crate and
//! lower a SELECT subset onto the operator tree, without this crate owning
//! any lexing or parsing itself.

pub mod ast;
pub mod collation;
pub mod compile;
pub mod config;
pub mod error;
pub mod index;
pub mod op;
pub mod order;
pub mod predicate;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use error::{EngineError, Result};
pub use row::{Row, RowId};
pub use table::{Assignment, MutableTable, PropertyValue, Table};
pub use value::Scalar;
