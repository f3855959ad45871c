//! This module implements the observability for the fee oracle. It exposes
//! functions which represent events that are meaningful to the system. These
//! functions are called when the corresponding events occur. They log the event
//! and update the metrics, if the event is worth measuring.

use {
    crate::{
        domain::{Snapshot, eth, estimator::Outcome, fee},
        infra::{blockchain::FetchError, cli},
    },
    prometheus::HistogramTimer,
};

mod metrics;

/// Setup the observability.
pub fn init(args: &cli::LoggingArgs) {
    observe::tracing::initialize(&observe::Config::new(
        &args.log,
        args.log_stderr_threshold,
        args.use_json_logs,
    ));
    metrics::init();
}

/// Observe that the header subscription is established.
pub fn tracking_started() {
    tracing::info!("subscribed to new block headers");
}

/// Observe that the header subscription terminated. No further blocks will be
/// processed.
pub fn feed_ended() {
    tracing::error!("block header subscription ended, fee estimates will go stale");
}

/// Observe a new block header.
pub fn new_block(number: eth::BlockNo) {
    tracing::info!(%number, "new block received");
    let metrics = metrics::get();
    metrics.blocks_received.inc();
    metrics.latest_block_number.set(number.into());
}

/// Observe a header that could not be used because it has no block number.
pub fn missing_block_number() {
    tracing::error!("discarding block header without block number");
    metrics::get().discarded_headers.inc();
}

/// Observe that fetching a block is about to start. The returned timer records
/// the fetch duration when dropped.
pub fn fetching(number: eth::BlockNo) -> HistogramTimer {
    tracing::trace!(%number, "fetching block");
    metrics::get().fetch_time.start_timer()
}

/// Observe a failed block fetch.
pub fn fetch_failed(number: eth::BlockNo, err: &FetchError) {
    tracing::error!(%number, ?err, "failed to fetch block details");
}

/// Observe a block without usable transactions.
pub fn malformed_block(number: eth::BlockNo, err: &fee::MalformedBlock) {
    tracing::error!(%number, %err, "block or block transactions are undefined");
}

/// Observe newly computed fee statistics.
pub fn estimated(number: eth::BlockNo, estimate: &fee::Estimate, outcome: Outcome) {
    tracing::info!(
        %number,
        base_fee_per_gas = %estimate.base_fee_per_gas,
        average_priority_fee = %estimate.average_priority_fee,
        outcome = outcome.label(),
        "estimated fees (gwei)"
    );
}

/// Observe the end of a fetch-and-compute cycle.
pub fn cycle_finished(outcome: Outcome, is_fee_current: bool) {
    let metrics = metrics::get();
    metrics.cycles.with_label_values(&[outcome.label()]).inc();
    metrics.is_fee_current.set(i64::from(is_fee_current));
}

/// Observe a fee estimate request.
pub fn estimate_requested(snapshot: &Snapshot) {
    tracing::debug!(?snapshot, "estimate fee requested");
}

/// Observe that the fee estimate could not be turned into a response.
pub fn estimate_response_failed(err: &dyn std::error::Error) {
    tracing::error!(%err, "estimate fee failed");
}
