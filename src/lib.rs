pub mod error;
pub mod modules;
pub mod proxy; // Forwarding service
mod utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use modules::logger;
use tracing::info;

/// Start the proxy and serve until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    // Keep the file writer alive until shutdown so buffered lines are flushed
    let _log_guard = logger::init_logger();

    let config = modules::config::load_proxy_config().context("Failed to load proxy config")?;

    // Interactive setup may block on stdin
    let env = modules::config::allowed_domains_from_env();
    let allowlist = tokio::task::spawn_blocking(move || {
        modules::setup::load_allowlist(env, Path::new(modules::config::ENV_FILE))
    })
    .await
    .context("Allowlist setup task failed")?
    .context("Failed to load allowlist")?;

    let transport = Arc::new(
        proxy::upstream::UpstreamClient::new(&config).context("Failed to create HTTP client")?,
    );

    let (server, handle) = proxy::AxumServer::start(&config, allowlist, transport)
        .await
        .context("Failed to start forwarding proxy")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server.stop();
    handle.await.ok();
    Ok(())
}
