#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{
        domain::Estimator,
        infra::{Api, blockchain, cli, observe},
    },
    anyhow::Context,
    clap::Parser,
    std::sync::Arc,
};

pub async fn start(args: impl Iterator<Item = String>) {
    if let Err(err) = run(args).await {
        tracing::error!(?err, "fee oracle failed");
        std::process::exit(1);
    }
}

/// Runs the oracle until a shutdown signal arrives.
pub async fn run(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let args = cli::Args::parse_from(args);
    observe::init(&args.logging);
    tracing::info!("running fee oracle with validated arguments:\n{}", args);

    let node = blockchain::Node::connect(&args.node_url().context("invalid node URL")?)
        .await
        .context("failed to connect to the node")?;
    let estimator = Estimator::new(Arc::new(node), args.stale_results.into());
    estimator
        .begin_tracking()
        .await
        .context("failed to subscribe to new blocks")?;

    Api {
        addr: args.addr(),
        estimator,
        addr_sender: None,
    }
    .serve(shutdown_signal())
    .await
    .context("API server failed")?;
    tracing::info!("fee oracle shut down");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept main signals for graceful shutdown.
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common.
    let interrupt = unix::signal(SignalKind::interrupt());
    let terminate = unix::signal(SignalKind::terminate());
    let (Ok(mut interrupt), Ok(mut terminate)) = (interrupt, terminate) else {
        tracing::warn!("signal handlers unavailable, running until killed");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
