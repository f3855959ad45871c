//! The fee estimation engine.
//!
//! Every new block header spawns an independent fetch of the full block, so a
//! slow node response never delays the handling of the next header. Fetches
//! for consecutive blocks may therefore complete out of order. The freshness
//! flag is protected against that by checking, when a fetch completes, whether
//! its block is still the latest one. The fee values themselves are handled
//! according to the configured [`UpdatePolicy`].

use {
    super::{eth, fee},
    crate::infra::{
        blockchain::{BlockFeed, FetchError, SubscriptionError},
        observe,
    },
    futures::{StreamExt, stream::BoxStream},
    std::sync::{Arc, Mutex},
    tokio::{sync::OnceCell, task::JoinHandle},
    tracing::Instrument,
};

/// Decides what happens to the fee values of a fetch that completes after a
/// fetch for a newer block has already been issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Every successful fetch stores its values, so a slow fetch for an older
    /// block can overwrite the values of a newer one.
    #[default]
    Overwrite,
    /// Every fetch gets a generation number when it is issued. Values are only
    /// stored if their generation is newer than that of the stored values.
    Monotonic,
}

/// Point in time view of the estimator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub latest_block_number: Option<eth::BlockNo>,
    pub base_fee_per_gas: Option<eth::Gwei>,
    pub average_priority_fee: Option<eth::Gwei>,
    /// Whether the fee values belong to `latest_block_number`.
    pub is_fee_current: bool,
}

/// How a single fetch-and-compute cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Values were stored and belong to the latest block.
    Fresh,
    /// Values were stored but a newer block was announced in the meantime.
    Stale,
    /// Values were computed but dropped because newer ones are already stored.
    Discarded,
    FetchFailed,
    Malformed,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Discarded => "discarded",
            Self::FetchFailed => "fetch_failed",
            Self::Malformed => "malformed",
        }
    }
}

/// Keeps track of the fees of the most recent block.
///
/// Cloning is cheap and all clones share the same state.
#[derive(Clone)]
pub struct Estimator(Arc<Inner>);

struct Inner {
    feed: Arc<dyn BlockFeed>,
    policy: UpdatePolicy,
    state: Mutex<State>,
    tracking: OnceCell<()>,
}

/// All fields are guarded by one lock so that readers never observe fee values
/// and the freshness flag from different updates.
#[derive(Debug, Default)]
struct State {
    latest_block_number: Option<eth::BlockNo>,
    estimate: Option<fee::Estimate>,
    is_fee_current: bool,
    /// Generation of the most recently issued fetch.
    issued: u64,
    /// Generation of the fetch whose values are stored.
    applied: u64,
}

impl State {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }
}

#[derive(Debug, thiserror::Error)]
enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Malformed(#[from] fee::MalformedBlock),
}

impl Estimator {
    pub fn new(feed: Arc<dyn BlockFeed>, policy: UpdatePolicy) -> Self {
        Self(Arc::new(Inner {
            feed,
            policy,
            state: Mutex::new(State::default()),
            tracking: OnceCell::new(),
        }))
    }

    /// Subscribes to new block headers and keeps processing them in a
    /// background task. Returns once the subscription is established.
    ///
    /// Calling this again after a successful subscription does nothing. A
    /// failed subscription is not retried, but a later call tries again.
    pub async fn begin_tracking(&self) -> Result<(), SubscriptionError> {
        self.0
            .tracking
            .get_or_try_init(|| async {
                let headers = self.0.feed.subscribe().await?;
                observe::tracking_started();
                tokio::spawn(
                    self.clone()
                        .track(headers)
                        .instrument(tracing::info_span!("fee_tracking")),
                );
                Ok::<_, SubscriptionError>(())
            })
            .await?;
        Ok(())
    }

    async fn track(self, mut headers: BoxStream<'static, eth::Header>) {
        while let Some(header) = headers.next().await {
            self.on_block_header(header);
        }
        observe::feed_ended();
    }

    /// Records the announced block as the latest one and starts computing its
    /// fees in a separate task. Returns the handle of that task, or `None` if
    /// the header was discarded.
    pub fn on_block_header(&self, header: eth::Header) -> Option<JoinHandle<Outcome>> {
        let Some(number) = header.number else {
            observe::missing_block_number();
            return None;
        };
        observe::new_block(number);
        // Generations are handed out here rather than in the spawned task so
        // that they follow the order in which the headers arrived. The block is
        // the latest one at this point, so freshness stays untouched.
        let generation = {
            let mut state = self.0.state.lock().unwrap();
            state.latest_block_number = Some(number);
            state.issue()
        };

        let estimator = self.clone();
        Some(tokio::spawn(
            async move { estimator.process(number, generation).await }
                .instrument(tracing::info_span!("block", %number)),
        ))
    }

    /// Fetches the given block and updates the fee values from it.
    ///
    /// Never fails: errors only demote the freshness flag and get logged, so
    /// the previous fee values remain available.
    pub async fn fetch_and_compute(&self, number: eth::BlockNo) -> Outcome {
        let generation = {
            let mut state = self.0.state.lock().unwrap();
            if state.latest_block_number != Some(number) {
                state.is_fee_current = false;
            }
            state.issue()
        };
        self.process(number, generation).await
    }

    /// Runs a cycle that was already issued. Only the state at completion is
    /// compared here, the spawned task may start after newer cycles finished.
    async fn process(&self, number: eth::BlockNo, generation: u64) -> Outcome {
        let result = self.compute(number).await;

        let (outcome, is_fee_current) = {
            let mut state = self.0.state.lock().unwrap();
            let is_latest = state.latest_block_number == Some(number);
            let outcome = match &result {
                Err(CycleError::Fetch(_)) => {
                    if is_latest {
                        state.is_fee_current = false;
                    }
                    Outcome::FetchFailed
                }
                Err(CycleError::Malformed(_)) => {
                    state.is_fee_current = false;
                    Outcome::Malformed
                }
                Ok(estimate) => {
                    let apply = match self.0.policy {
                        UpdatePolicy::Overwrite => true,
                        UpdatePolicy::Monotonic => generation > state.applied,
                    };
                    if apply {
                        state.estimate = Some(estimate.clone());
                        state.applied = generation;
                        state.is_fee_current = is_latest;
                        if is_latest {
                            Outcome::Fresh
                        } else {
                            Outcome::Stale
                        }
                    } else {
                        Outcome::Discarded
                    }
                }
            };
            (outcome, state.is_fee_current)
        };

        match result {
            Ok(estimate) => observe::estimated(number, &estimate, outcome),
            Err(CycleError::Fetch(err)) => observe::fetch_failed(number, &err),
            Err(CycleError::Malformed(err)) => observe::malformed_block(number, &err),
        }
        observe::cycle_finished(outcome, is_fee_current);
        outcome
    }

    async fn compute(&self, number: eth::BlockNo) -> Result<fee::Estimate, CycleError> {
        let block = {
            let _timer = observe::fetching(number);
            self.0.feed.block(number).await?
        };
        let block = block.ok_or(fee::MalformedBlock::Missing)?;
        Ok(fee::estimate(&block)?)
    }

    pub fn latest_block_number(&self) -> Option<eth::BlockNo> {
        self.0.state.lock().unwrap().latest_block_number
    }

    pub fn latest_base_fee_per_gas(&self) -> Option<eth::Gwei> {
        let state = self.0.state.lock().unwrap();
        state
            .estimate
            .as_ref()
            .map(|estimate| estimate.base_fee_per_gas.clone())
    }

    pub fn latest_average_priority_fee(&self) -> Option<eth::Gwei> {
        let state = self.0.state.lock().unwrap();
        state
            .estimate
            .as_ref()
            .map(|estimate| estimate.average_priority_fee.clone())
    }

    pub fn is_fee_current(&self) -> bool {
        self.0.state.lock().unwrap().is_fee_current
    }

    /// Reads all values at once.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.0.state.lock().unwrap();
        Snapshot {
            latest_block_number: state.latest_block_number,
            base_fee_per_gas: state
                .estimate
                .as_ref()
                .map(|estimate| estimate.base_fee_per_gas.clone()),
            average_priority_fee: state
                .estimate
                .as_ref()
                .map(|estimate| estimate.average_priority_fee.clone()),
            is_fee_current: state.is_fee_current,
        }
    }
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("policy", &self.0.policy)
            .field("state", &self.0.state)
            .finish()
    }
}
