//! Feed read collectors. Cache hit/miss counts per namespace come from
//! `shared_cache::CacheMetrics`; these cover what the cache cannot see.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// scope: global | owner, source: cache | store
    pub static ref FEED_READ_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_read_duration_seconds",
        "Feed read latency by scope and where the payload came from",
        &["scope", "source"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("failed to register feed_read_duration_seconds");

    pub static ref FEED_READS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_reads_total",
        "Feed reads by scope and source",
        &["scope", "source"]
    )
    .expect("failed to register feed_reads_total");

    /// result: stored | dropped_stale | failed
    pub static ref FEED_WRITEBACK_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_writeback_total",
        "Assembled feeds written back to the cache, or dropped because a mutation overlapped the read",
        &["result"]
    )
    .expect("failed to register feed_writeback_total");

    /// source: cache | live | placeholder
    pub static ref PROFILE_RESOLUTION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "profile_resolution_total",
        "Owner profile resolutions during enrichment",
        &["source"]
    )
    .expect("failed to register profile_resolution_total");
}
