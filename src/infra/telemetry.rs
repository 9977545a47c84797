use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::auth::METRIC_AUTH_FAILURE;
use crate::config::{LogFormat, LoggingSettings};

use super::cache::{METRIC_CACHE_CLEAR, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
use super::error::InfraError;
use super::http::middleware::METRIC_HTTP_REQUEST_MS;

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
            InfraError::Telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Public responses served from the response cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Public responses that had to be rendered."
        );
        describe_counter!(
            METRIC_CACHE_CLEAR,
            Unit::Count,
            "Response cache flushes triggered by editor writes."
        );
        describe_counter!(
            METRIC_AUTH_FAILURE,
            Unit::Count,
            "Rejected logins and session checks, labelled by reason."
        );
        describe_histogram!(
            METRIC_HTTP_REQUEST_MS,
            Unit::Milliseconds,
            "Request latency by method and status."
        );
    });
}
