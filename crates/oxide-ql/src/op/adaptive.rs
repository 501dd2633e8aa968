//! The adaptive optimizer (§4.12): wraps a base table and measures the
//! first `adaptive_measure_window` `has`/`eq` calls. If the projected cost
//! of the remaining expected calls justifies it, it builds an index on the
//! queried column; past `adaptive_materialize_threshold` rows the
//! underlying [`crate::index::Index`] escalates to its own materialized
//! tier on its own (§4.12's "materialized" escalation is realized by
//! delegating to that existing mechanism rather than duplicating it here —
//! see `DESIGN.md`).

use crate::config::EngineConfig;
use crate::schema::ColumnName;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Caller-supplied hints about expected future call volume, set via
/// `with_expected_has_calls`/`with_expected_eq_calls`/`with_index_on`.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveHints {
    pub expected_has_calls: Option<usize>,
    pub expected_eq_calls: BTreeMap<ColumnName, usize>,
    pub index_on: Vec<ColumnName>,
}

#[derive(Debug, Default)]
struct ColumnMeasurement {
    calls: usize,
    total: Duration,
    indexed: bool,
}

/// Mutable measurement/escalation state, shared (via `Arc<RefCell<_>>`) by
/// every clone of the `AdaptiveNode` that wraps the same base table, since
/// builder clones must still observe each other's measurements — a
/// `.limit(5)` clone shouldn't reset the counter a sibling clone already
/// advanced.
#[derive(Debug, Default)]
pub struct Measurements {
    per_column: BTreeMap<ColumnName, ColumnMeasurement>,
    has_calls: usize,
    has_total: Duration,
    has_indexed: bool,
}

impl Measurements {
    /// Records one `eq`/`has` measurement for `column` and returns `true`
    /// the first time this column's measurement crosses the point where an
    /// index should be built (caller is responsible for actually building
    /// it and marking `indexed`).
    pub fn record_eq(
        &mut self,
        column: &ColumnName,
        elapsed: Duration,
        config: &EngineConfig,
        hints: &AdaptiveHints,
    ) -> bool {
        let entry = self.per_column.entry(column.clone()).or_default();
        if entry.indexed {
            return false;
        }
        entry.calls += 1;
        entry.total += elapsed;
        if entry.calls < config.adaptive_measure_window {
            return false;
        }
        let avg = entry.total.as_secs_f64() * 1000.0 / entry.calls as f64;
        let expected_remaining = hints
            .expected_eq_calls
            .get(column)
            .copied()
            .unwrap_or(0)
            .saturating_sub(entry.calls);
        let projected_ms = avg * expected_remaining as f64;
        let forced = hints.index_on.iter().any(|c| c == column);
        if forced || projected_ms >= config.adaptive_time_threshold_ms {
            entry.indexed = true;
            tracing::debug!(
                column = %column,
                projected_ms,
                forced,
                "adaptive optimizer building index"
            );
            true
        } else {
            false
        }
    }

    pub fn record_has(&mut self, elapsed: Duration, config: &EngineConfig, hints: &AdaptiveHints) -> bool {
        if self.has_indexed {
            return false;
        }
        self.has_calls += 1;
        self.has_total += elapsed;
        if self.has_calls < config.adaptive_measure_window {
            return false;
        }
        let avg = self.has_total.as_secs_f64() * 1000.0 / self.has_calls as f64;
        let expected_remaining = hints
            .expected_has_calls
            .unwrap_or(0)
            .saturating_sub(self.has_calls);
        let projected_ms = avg * expected_remaining as f64;
        if projected_ms >= config.adaptive_time_threshold_ms {
            self.has_indexed = true;
            tracing::debug!(projected_ms, "adaptive optimizer building whole-row index");
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_indexed(&self, column: &ColumnName) -> bool {
        self.per_column.get(column).is_some_and(|m| m.indexed)
    }

    #[must_use]
    pub fn is_has_indexed(&self) -> bool {
        self.has_indexed
    }
}

/// Times a closure and feeds the elapsed duration to `record`, returning
/// the closure's own result.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

#[derive(Debug, Clone)]
pub struct AdaptiveNode {
    pub base: crate::table::Table,
    pub hints: AdaptiveHints,
    pub measurements: Arc<RefCell<Measurements>>,
    pub limit: Option<usize>,
    pub offset: usize,
}
