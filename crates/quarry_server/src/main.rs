use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = quarry_server::ServerConfig::from_env()?;

    let server = quarry_server::start_server(config.addr).await?;
    tracing::info!(
        addr = %server.addr,
        endpoint = %server.preference_endpoint(),
        "quarry preference service listening"
    );
    server.wait().await?;
    Ok(())
}
