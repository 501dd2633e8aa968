//! Tunable engine constants, grouped the way `oxide-migrate` groups its
//! executor configuration instead of scattering magic numbers through the
//! operator implementations.

/// Knobs that influence which execution strategy an operator picks.
///
/// All operators carry a `Arc<EngineConfig>` by way of the base table they
/// were built on, so tuning is per-engine-instance, not global.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Above this `k = limit + offset`, the sort operator buffers and does a
    /// full sort instead of a bounded max-heap.
    pub heap_top_k_threshold: usize,

    /// Row count processed per chunk by the block hash-join and block hash
    /// exists strategies.
    pub hash_join_chunk_size: usize,

    /// Number of initial `has`/`eq` calls the adaptive optimizer measures
    /// before deciding whether to build an index.
    pub adaptive_measure_window: usize,

    /// Minimum projected remaining cost (in milliseconds) that justifies
    /// building an index during adaptive measurement.
    pub adaptive_time_threshold_ms: f64,

    /// Row count above which an adaptive index escalates to a materialized
    /// backing store instead of an in-memory structure.
    pub adaptive_materialize_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heap_top_k_threshold: 1000,
            hash_join_chunk_size: 64,
            adaptive_measure_window: 3,
            adaptive_time_threshold_ms: 50.0,
            adaptive_materialize_threshold: 500_000,
        }
    }
}
