use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "galleria_cache_hit_total",
            Unit::Count,
            "Collection reads answered from a fresh cache entry."
        );
        describe_counter!(
            "galleria_cache_miss_total",
            Unit::Count,
            "Collection reads that found no fresh cache entry."
        );
        describe_counter!(
            "galleria_cache_invalidate_total",
            Unit::Count,
            "Cache entries dropped by mutations or forced refreshes."
        );
        describe_counter!(
            "galleria_tier_failure_total",
            Unit::Count,
            "Storage tier reads that failed or timed out."
        );
        describe_counter!(
            "galleria_tier_served_total",
            Unit::Count,
            "Collection reads served by each storage tier."
        );
        describe_counter!(
            "galleria_mutation_fallback_total",
            Unit::Count,
            "Mutations rerouted from the primary store to the fallback store."
        );
        describe_histogram!(
            "galleria_gallery_fetch_ms",
            Unit::Milliseconds,
            "Latency of collection loads that went to the storage tiers."
        );
    });
}
