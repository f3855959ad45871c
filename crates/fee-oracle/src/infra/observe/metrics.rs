/// Metrics for the fee oracle.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// Number of new block headers received.
    pub blocks_received: prometheus::IntCounter,
    /// Number of block headers discarded because they had no block number.
    pub discarded_headers: prometheus::IntCounter,
    /// The results of the fetch-and-compute cycles.
    #[metric(labels("result"))]
    pub cycles: prometheus::IntCounterVec,
    /// Most recently announced block number.
    pub latest_block_number: prometheus::core::GenericGauge<prometheus::core::AtomicU64>,
    /// Whether the served fees belong to the latest block (1) or not (0).
    pub is_fee_current: prometheus::IntGauge,
    /// Time spent fetching full blocks.
    #[metric(buckets(0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0))]
    pub fetch_time: prometheus::Histogram,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry("fee_oracle");
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
