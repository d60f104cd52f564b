//! Helper server binary

use anyhow::Context;
use helper_server::{router, ServerConfig};
use tally_web::server::{serve, shutdown_signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helper_server=info,tally_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;
    let addr = config.addr();
    tracing::info!(%addr, "Starting helper server");

    serve(router(), addr, shutdown_signal())
        .await
        .with_context(|| format!("serving on {addr}"))
}
