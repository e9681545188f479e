#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = allowlist_proxy_lib::run().await {
        tracing::error!("Proxy exited with error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
