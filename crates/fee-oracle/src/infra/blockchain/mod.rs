//! Access to the chain the oracle follows.

use {crate::domain::eth, futures::stream::BoxStream};

mod node;

pub use self::node::Node;

/// Source of new block notifications and block bodies.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BlockFeed: Send + Sync + 'static {
    /// Subscribes to new block headers. The stream yields headers in the order
    /// the node announced them.
    async fn subscribe(&self) -> Result<BoxStream<'static, eth::Header>, SubscriptionError>;

    /// Fetches the block with the given number including full transaction
    /// objects. Returns `None` if the node doesn't know the block.
    async fn block(&self, number: eth::BlockNo) -> Result<Option<eth::Block>, FetchError>;
}

/// Connecting to the feed or registering the header subscription failed.
#[derive(Debug, thiserror::Error)]
#[error("block subscription failed: {0:#}")]
pub struct SubscriptionError(#[from] anyhow::Error);

/// Fetching a single block failed.
#[derive(Debug, thiserror::Error)]
#[error("block fetch failed: {0:#}")]
pub struct FetchError(#[from] anyhow::Error);
