use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

lazy_static! {
    /// Mutations by operation and result (ok or the error kind).
    pub static ref MUTATION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_mutation_total",
        "Content mutations segmented by operation and result",
        &["operation", "result"]
    )
    .expect("failed to register content_mutation_total");

    /// Domain events published to the hub by kind.
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "realtime_events_published_total",
        "Domain events published segmented by kind",
        &["kind"]
    )
    .expect("failed to register realtime_events_published_total");

    /// Per-viewer deliveries by kind.
    pub static ref EVENT_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "realtime_event_deliveries_total",
        "Domain events handed to viewer connections segmented by kind",
        &["kind"]
    )
    .expect("failed to register realtime_event_deliveries_total");

    /// Currently subscribed viewer connections.
    pub static ref VIEWER_CONNECTIONS: IntGauge = register_int_gauge!(
        "realtime_viewer_connections",
        "Viewer connections currently subscribed to the event hub"
    )
    .expect("failed to register realtime_viewer_connections");
}
