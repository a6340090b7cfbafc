// Telemetry: structured logging and Prometheus metrics

use crate::config::LogFormat;
use crate::errors::CatalogError;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const CATALOG_OPERATIONS_TOTAL: &str = "catalog_operations_total";
pub const PERSISTENCE_READY: &str = "persistence_ready";
pub const LIFECYCLE_TRANSITIONS_TOTAL: &str = "lifecycle_transitions_total";

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `log_level` when set. The JSON layer
/// carries span context (current span and span list) on every entry; the
/// pretty layer is meant for local development.
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level, ?format, "Structured logging initialized");
    Ok(())
}

/// Install the Prometheus recorder and describe every metric
///
/// The returned handle renders the exposition text served on `/metrics`;
/// no separate listener is started.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    describe_counter!(
        CATALOG_OPERATIONS_TOTAL,
        "Catalog operations by operation and outcome"
    );
    describe_gauge!(
        PERSISTENCE_READY,
        "1 when the database is connected and migrated, 0 otherwise"
    );
    describe_counter!(
        LIFECYCLE_TRANSITIONS_TOTAL,
        "Lifecycle state changes by target state"
    );
    gauge!(PERSISTENCE_READY).set(0.0);

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Count one catalog operation and pass its result through unchanged
///
/// The outcome label is `ok` or the error's [`CatalogError::kind`].
#[inline]
pub fn observe_catalog_operation<T>(
    operation: &'static str,
    result: Result<T, CatalogError>,
) -> Result<T, CatalogError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    counter!(CATALOG_OPERATIONS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);

    if let Err(e) = &result {
        tracing::debug!(operation, outcome, error = %e, "Catalog operation failed");
    }
    result
}

/// Record a lifecycle state change
#[inline]
pub fn record_lifecycle_transition(to: &'static str, ready: bool) {
    counter!(LIFECYCLE_TRANSITIONS_TOTAL, "to" => to).increment(1);
    gauge!(PERSISTENCE_READY).set(if ready { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_single_shot() {
        // Another test may already own the global subscriber
        let first = init_logging("info", LogFormat::Json);
        let second = init_logging("debug", LogFormat::Pretty);
        assert!(first.is_err() || second.is_err());
    }

    #[test]
    fn test_observe_passes_result_through() {
        let ok: Result<u8, CatalogError> = Ok(7);
        assert_eq!(observe_catalog_operation("get_resource", ok).unwrap(), 7);

        let err: Result<u8, CatalogError> = Err(CatalogError::not_found("resource", 3));
        assert!(matches!(
            observe_catalog_operation("get_resource", err),
            Err(CatalogError::NotFound { id: 3, .. })
        ));
    }

    #[test]
    fn test_metrics_are_rendered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let _ = observe_catalog_operation::<()>(
                "delete_resource",
                Err(CatalogError::not_found("resource", 1)),
            );
            record_lifecycle_transition("ready", true);
        });

        let text = handle.render();
        assert!(text.contains(CATALOG_OPERATIONS_TOTAL));
        assert!(text.contains("operation=\"delete_resource\""));
        assert!(text.contains("outcome=\"not_found\""));
        assert!(text.contains("persistence_ready 1"));
    }

    #[test]
    fn test_installed_recorder_sees_catalog_metrics() {
        // Only test in this crate that installs the global recorder
        let handle = init_metrics().unwrap();

        let _ = observe_catalog_operation::<()>(
            "set_featured",
            Err(CatalogError::not_found("resource", 9)),
        );
        record_lifecycle_transition("degraded", false);

        let text = handle.render();
        assert!(text.contains(CATALOG_OPERATIONS_TOTAL));
        assert!(text.contains("operation=\"set_featured\""));
        assert!(text.contains(LIFECYCLE_TRANSITIONS_TOTAL));
        assert!(text.contains(PERSISTENCE_READY));
    }
}
