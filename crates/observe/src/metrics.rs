use std::sync::OnceLock;

/// Global metrics registry used by all components.
static REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Sets up the global registry with a prefix for all metric names. Must run
/// before the registry is first used and panics otherwise.
pub fn setup_registry(prefix: &str) {
    let registry = prometheus::Registry::new_custom(Some(prefix.to_owned()), None)
        .expect("invalid metrics prefix");
    if REGISTRY
        .set(prometheus_metric_storage::StorageRegistry::new(registry))
        .is_err()
    {
        panic!("metrics registry is already set up");
    }
}

/// Get the global instance of the metrics registry.
pub fn get_registry() -> &'static prometheus::Registry {
    get_storage_registry().registry()
}

/// Get the global instance of the metric storage registry.
///
/// Falls back to an unprefixed registry if [`setup_registry`] was not called.
pub fn get_storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    REGISTRY.get_or_init(prometheus_metric_storage::StorageRegistry::default)
}

/// Renders all metrics of the registry in the prometheus text format.
pub fn encode(registry: &prometheus::Registry) -> Result<String, prometheus::Error> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    prometheus::Encoder::encode(&encoder, &registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `/metrics` route exposing encoded prometheus data to the monitoring system.
pub fn handle_metrics() -> axum::Router {
    async fn metrics_handler() -> Result<String, axum::http::StatusCode> {
        encode(get_registry()).map_err(|err| {
            tracing::error!(?err, "failed to encode metrics");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        })
    }

    axum::Router::new().route("/metrics", axum::routing::get(metrics_handler))
}
