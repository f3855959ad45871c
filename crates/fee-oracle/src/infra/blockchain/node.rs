use {
    super::{BlockFeed, FetchError, SubscriptionError},
    crate::domain::eth,
    alloy::{
        consensus::Transaction as _,
        eips::BlockNumberOrTag,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::{Block, Transaction},
        transports::ws::WsConnect,
    },
    anyhow::Context as _,
    futures::{StreamExt, stream::BoxStream},
    url::Url,
};

/// An Ethereum node reached over a websocket connection.
///
/// The websocket transport reconnects on its own, so a single connection is
/// kept for the lifetime of the process.
#[derive(Clone)]
pub struct Node {
    provider: DynProvider,
}

impl Node {
    pub async fn connect(url: &Url) -> Result<Self, SubscriptionError> {
        // The path usually embeds the API key, so only the host gets logged.
        tracing::info!(host = ?url.host_str(), "connecting to node");
        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(url.as_str()))
            .await
            .context("failed to connect to websocket")?
            .erased();
        Ok(Self { provider })
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl BlockFeed for Node {
    async fn subscribe(&self) -> Result<BoxStream<'static, eth::Header>, SubscriptionError> {
        let headers = self
            .provider
            .subscribe_blocks()
            .await
            .context("failed to subscribe to new block headers")?
            .into_stream()
            .map(|header| eth::Header {
                number: Some(header.number.into()),
            });
        Ok(headers.boxed())
    }

    async fn block(&self, number: eth::BlockNo) -> Result<Option<eth::Block>, FetchError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number.into()))
            .full()
            .await
            .with_context(|| format!("failed to fetch block {number}"))?;
        Ok(block.map(into_domain))
    }
}

fn into_domain(block: Block) -> eth::Block {
    eth::Block {
        number: block.header.number.into(),
        base_fee_per_gas: block.header.base_fee_per_gas.map(eth::Wei::from),
        transactions: block
            .transactions
            .as_transactions()
            .map(|transactions| transactions.iter().map(into_tx).collect()),
    }
}

/// Legacy and access list transactions carry their gas price directly. For
/// fee market transactions the node reports the price that was effectively
/// paid once the transaction is mined.
fn into_tx(tx: &Transaction) -> eth::Tx {
    eth::Tx {
        gas_price: tx
            .gas_price()
            .or(tx.effective_gas_price)
            .map(eth::Wei::from),
    }
}
