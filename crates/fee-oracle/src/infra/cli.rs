//! CLI arguments for the `fee-oracle` binary.

use {
    crate::domain::UpdatePolicy,
    clap::Parser,
    std::{
        fmt::{self, Display, Formatter},
        net::{IpAddr, SocketAddr},
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

/// Serve gas fee estimates for the chain head of an Ethereum node.
#[derive(Parser)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    pub logging: LoggingArgs,

    /// The address to bind the HTTP server to.
    #[arg(long, env, default_value = "0.0.0.0")]
    pub bind_host: IpAddr,

    /// The port to bind the HTTP server to.
    #[arg(long, env, default_value_t = 3000)]
    pub port: u16,

    /// Websocket endpoint of the node. The API key gets appended to it.
    #[arg(
        long,
        env = "INFURA_ETH_MAINNET_WSS_URL",
        default_value = "wss://mainnet.infura.io/ws/v3/"
    )]
    pub node_ws_url: String,

    /// API key for the node provider.
    #[arg(long, env = "INFURA_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// What to do with fees of a block that arrive after a newer block was
    /// announced.
    #[arg(long, env, value_enum, default_value_t = StaleResults::Overwrite)]
    pub stale_results: StaleResults,
}

#[derive(Parser)]
pub struct LoggingArgs {
    /// The log filter.
    #[arg(long, env, default_value = "info")]
    pub log: String,

    /// Events more severe than this level are logged to stderr.
    #[arg(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Log events as JSON.
    #[arg(long, env, default_value_t = false)]
    pub use_json_logs: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum StaleResults {
    /// Late results overwrite the stored fees (but never mark them current).
    Overwrite,
    /// Late results are dropped if fees of a newer block are already stored.
    Monotonic,
}

impl From<StaleResults> for UpdatePolicy {
    fn from(value: StaleResults) -> Self {
        match value {
            StaleResults::Overwrite => Self::Overwrite,
            StaleResults::Monotonic => Self::Monotonic,
        }
    }
}

impl Args {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }

    /// The full node URL including the API key.
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        format!("{}{}", self.node_ws_url, self.api_key).parse()
    }
}

impl Display for Args {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            bind_host,
            port,
            node_ws_url,
            api_key,
            stale_results,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "bind_host: {bind_host}")?;
        writeln!(f, "port: {port}")?;
        writeln!(f, "node_ws_url: {node_ws_url}")?;
        let api_key = if api_key.is_empty() { "" } else { "SECRET" };
        writeln!(f, "api_key: {api_key}")?;
        writeln!(f, "stale_results: {stale_results:?}")?;
        Ok(())
    }
}

impl Display for LoggingArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log: {log}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}
