//! Error taxonomy for the query engine.
//!
//! Mirrors the five categories a builder or iterator can raise: schema
//! errors at construction time, binding errors for unresolved placeholders,
//! usage errors for misuse of the mutation/adaptive APIs, type errors for
//! non-comparable values, and integrity errors for constraint violations.
//! Syntax errors belong to the upstream SQL parser and are never produced
//! here.

use thiserror::Error;

/// Errors raised by table operators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown column referenced in a builder call, a column-count mismatch
    /// in a set operation, a widening projection, or a join column clash.
    #[error("schema error: {0}")]
    Schema(String),

    /// An unbound placeholder at iteration time, an unknown placeholder
    /// passed to `bind`, or a duplicate binding of the same placeholder.
    #[error("binding error: {0}")]
    Binding(String),

    /// A mutation view not derived from its target table, or wrapping a
    /// non-base table with the adaptive optimizer.
    #[error("usage error: {0}")]
    Usage(String),

    /// A non-comparable value passed to a comparison operator, or a
    /// malformed literal.
    #[error("type error: {0}")]
    Type(String),

    /// A primary-key or uniqueness violation on insert.
    #[error("integrity error: {0}")]
    Integrity(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub(crate) fn unknown_column(name: &str) -> Self {
        Self::Schema(format!("unknown column: {name}"))
    }

    pub(crate) fn widening_projection() -> Self {
        Self::Schema("projection must narrow the visible column set, not widen it".into())
    }

    pub(crate) fn column_count_mismatch(left: usize, right: usize) -> Self {
        Self::Schema(format!(
            "set operation requires matching column counts, got {left} and {right}"
        ))
    }

    pub(crate) fn join_column_conflict(name: &str) -> Self {
        Self::Schema(format!(
            "both sides of the join already have a column named '{name}'; alias one side"
        ))
    }

    pub(crate) fn unbound_placeholders(names: &[String]) -> Self {
        Self::Binding(format!("unbound placeholders: {}", names.join(", ")))
    }

    pub(crate) fn unknown_placeholder(name: &str) -> Self {
        Self::Binding(format!("bind() received unknown placeholder: {name}"))
    }

    pub(crate) fn duplicate_binding(name: &str) -> Self {
        Self::Binding(format!("placeholder already bound: {name}"))
    }

    pub(crate) fn foreign_view(origin: &str) -> Self {
        Self::Usage(format!(
            "update/delete view does not derive from this table's storage (origin: {origin})"
        ))
    }

    pub(crate) fn adaptive_requires_base() -> Self {
        Self::Usage("the adaptive optimizer can only wrap a base table".into())
    }

    pub(crate) fn not_comparable(op: &str, ty: &str) -> Self {
        Self::Type(format!("{ty} is not comparable with '{op}'"))
    }

    pub(crate) fn malformed_literal(text: &str) -> Self {
        Self::Type(format!("malformed literal: {text}"))
    }

    pub(crate) fn primary_key_violation(value: &str) -> Self {
        Self::Integrity(format!("primary key violation for value: {value}"))
    }

    pub(crate) fn unique_violation(column: &str, value: &str) -> Self {
        Self::Integrity(format!("unique constraint violated on '{column}': {value}"))
    }

    /// A statement shape `compile::compile_select` declines to lower (a
    /// join, a subquery, `GROUP BY`/`HAVING`, a set operation, DML, DDL).
    pub(crate) fn unsupported_statement() -> Self {
        Self::Usage(
            "statement shape is not supported by compile_select; build the operator tree \
             directly via Table's builder methods instead"
                .into(),
        )
    }
}
