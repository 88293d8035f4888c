//! Process-wide invalidation counters.
//!
//! Collectors are created unregistered and attached to [`REGISTRY`] on first
//! use. Embedders that run their own registry call
//! [`register_custom_metrics`] with it instead.

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::warn;

lazy_static! {
    pub static ref REGISTERED_MESSAGES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("inval_registered_messages", "Invalidations queued in a transaction frame"),
        &["class"]
    )
    .expect("metric can not be created");

    pub static ref LOCAL_APPLIED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("inval_local_applied", "Invalidations applied to local caches"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref BROADCAST_MESSAGES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("inval_broadcast_messages", "Invalidations handed to the shared queue"),
        &["path"]
    )
    .expect("metric can not be created");

    pub static ref CACHE_RESET_METRIC: IntCounter =
        IntCounter::new("inval_cache_resets", "Full resets of all local caches")
            .expect("metric can not be created");

    pub static ref TRANSACTION_EVENTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("inval_transaction_events", "Transaction lifecycle events seen by the invalidation stack"),
        &["event"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry).expect("collector can be registered");
        registry
    };
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(REGISTERED_MESSAGES_METRIC.clone()))?;
    registry.register(Box::new(LOCAL_APPLIED_METRIC.clone()))?;
    registry.register(Box::new(BROADCAST_MESSAGES_METRIC.clone()))?;
    registry.register(Box::new(CACHE_RESET_METRIC.clone()))?;
    registry.register(Box::new(TRANSACTION_EVENTS_METRIC.clone()))?;
    Ok(())
}

/// Renders `registry` in the Prometheus text exposition format
pub fn gather_text(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        warn!("could not encode invalidation metrics: {}", e);
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(e) => {
            warn!("invalidation metrics could not be from_utf8'd: {}", e);
            String::new()
        }
    }
}
