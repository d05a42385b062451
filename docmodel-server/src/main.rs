//! docmodel-server entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use docmodel_server::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    if let Err(error) = docmodel_server::run(config).await {
        tracing::error!(target: "docmodel::server", %error, "server stopped");
        std::process::exit(1);
    }
}
