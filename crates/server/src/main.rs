use gobble_proxy::config::ServerConfig;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = ServerConfig::load()?;
    gobble_proxy::start_server(config).await
}
