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

/// Environment variable holding `EnvFilter` directives that override
/// `logging.level`, e.g. `ssr_engine::cache=debug`.
pub const LOG_FILTER_ENV: &str = "SSR_ENGINE_LOG";

/// Install a global tracing subscriber for the engine.
///
/// Hosts that already install their own subscriber can skip this and call
/// [`describe_metrics`] directly. JSON output carries the enclosing render
/// span so each event is tied to its path and URL.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .with_env_var(LOG_FILTER_ENV)
        .from_env_lossy();

    let output = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(output)
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))
}

/// Register descriptions for every metric the engine emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "ssr_factory_cache_hit_total",
            Unit::Count,
            "Total number of factory cache hits."
        );
        describe_counter!(
            "ssr_factory_cache_miss_total",
            Unit::Count,
            "Total number of compile attempts after a factory cache miss."
        );
        describe_counter!(
            "ssr_factory_cache_coalesced_total",
            Unit::Count,
            "Total number of renders that waited on another render's compile."
        );
        describe_counter!(
            "ssr_compile_total",
            Unit::Count,
            "Total number of successful bootstrap module compiles."
        );
        describe_counter!(
            "ssr_compile_failure_total",
            Unit::Count,
            "Total number of rejected bootstrap module compiles."
        );
        describe_counter!(
            "ssr_document_cache_hit_total",
            Unit::Count,
            "Total number of document cache hits."
        );
        describe_counter!(
            "ssr_document_read_total",
            Unit::Count,
            "Total number of documents read from storage."
        );
        describe_counter!(
            "ssr_render_total",
            Unit::Count,
            "Total number of successful renders."
        );
        describe_counter!(
            "ssr_render_failure_total",
            Unit::Count,
            "Total number of failed renders, labelled by error kind."
        );
        describe_histogram!(
            "ssr_compile_ms",
            Unit::Milliseconds,
            "Bootstrap module compile latency in milliseconds."
        );
        describe_histogram!(
            "ssr_render_ms",
            Unit::Milliseconds,
            "Platform render latency in milliseconds."
        );
    });
}
