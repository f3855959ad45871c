//! Serve the fee estimate API.

use {
    crate::domain::Estimator,
    std::{future::Future, net::SocketAddr},
    tokio::sync::oneshot,
};

mod error;
mod routes;

pub struct Api {
    pub addr: SocketAddr,
    pub estimator: Estimator,
    /// Receives the bound address, which differs from `addr` when binding to
    /// port 0.
    pub addr_sender: Option<oneshot::Sender<SocketAddr>>,
}

impl Api {
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let app = router(self.estimator);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(port = local_addr.port(), "serving fee oracle");
        if let Some(addr_sender) = self.addr_sender {
            let _ = addr_sender.send(local_addr);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// All routes of the oracle.
pub fn router(estimator: Estimator) -> axum::Router {
    let eth_mainnet = routes::estimate_fee(axum::Router::new()).with_state(estimator);

    let app = axum::Router::new().nest("/api/eth-mainnet", eth_mainnet);
    let app = routes::healthz(app);
    app.merge(observe::metrics::handle_metrics())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            domain::{UpdatePolicy, eth},
            infra::blockchain::MockBlockFeed,
        },
        axum::{
            body::Body,
            http::{Request, StatusCode},
        },
        mockall::predicate::eq,
        serde_json::{Value, json},
        std::sync::Arc,
        tokio::io::{AsyncReadExt as _, AsyncWriteExt as _},
        tower::ServiceExt as _,
    };

    const GWEI: u64 = 1_000_000_000;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn estimate_before_first_block() {
        let estimator = Estimator::new(Arc::new(MockBlockFeed::new()), UpdatePolicy::Overwrite);

        let (status, body) = get(router(estimator), "/api/eth-mainnet/estimate-fee").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({
                "baseFeePerGas": null,
                "averagePriorityFee": null,
                "latestBlockNumber": null,
                "isFeeUpdated": false,
            })
        );
    }

    #[tokio::test]
    async fn estimate_of_latest_block() {
        let mut feed = MockBlockFeed::new();
        feed.expect_block()
            .with(eq(eth::BlockNo(100)))
            .returning(|_| {
                Ok(Some(eth::Block {
                    number: eth::BlockNo(100),
                    base_fee_per_gas: Some(eth::Wei::from(GWEI)),
                    transactions: Some(
                        (1..=5)
                            .map(|i| eth::Tx {
                                gas_price: Some(eth::Wei::from(i * GWEI)),
                            })
                            .collect(),
                    ),
                }))
            });
        let estimator = Estimator::new(Arc::new(feed), UpdatePolicy::Overwrite);
        estimator
            .on_block_header(eth::Header {
                number: Some(eth::BlockNo(100)),
            })
            .unwrap()
            .await
            .unwrap();

        let (status, body) = get(router(estimator), "/api/eth-mainnet/estimate-fee").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({
                "baseFeePerGas": 1.0,
                "averagePriorityFee": 2.0,
                "latestBlockNumber": 100,
                "isFeeUpdated": true,
            })
        );
    }

    #[tokio::test]
    async fn healthz() {
        let estimator = Estimator::new(Arc::new(MockBlockFeed::new()), UpdatePolicy::Overwrite);

        let (status, _) = get(router(estimator), "/healthz").await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_routes() {
        let estimator = Estimator::new(Arc::new(MockBlockFeed::new()), UpdatePolicy::Overwrite);

        for uri in ["/", "/api/eth-mainnet", "/api/eth-goerli/estimate-fee"] {
            let (status, _) = get(router(estimator.clone()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn serves_on_bound_address_until_shutdown() {
        let estimator = Estimator::new(Arc::new(MockBlockFeed::new()), UpdatePolicy::Overwrite);
        let (addr_sender, addr_receiver) = oneshot::channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
        let server = tokio::spawn(
            Api {
                addr: ([127, 0, 0, 1], 0).into(),
                estimator,
                addr_sender: Some(addr_sender),
            }
            .serve(async {
                let _ = shutdown_receiver.await;
            }),
        );
        let addr = addr_receiver.await.unwrap();
        assert_ne!(addr.port(), 0);

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        shutdown_sender.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
