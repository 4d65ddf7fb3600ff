use anyhow::Context as _;
use std::net::SocketAddr;

pub mod engine;
pub mod preference_service;

pub use preference_service::{PREFERENCE_PATH, PreferenceTable};

pub const SERVER_ADDR_ENV: &str = "QUARRY_SERVER_ADDR";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8422";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let raw = quarry_backend::optional_trimmed_from_env(SERVER_ADDR_ENV)?
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_owned());
        let addr = raw
            .parse()
            .with_context(|| format!("invalid {SERVER_ADDR_ENV} {raw:?}"))?;
        Ok(Self { addr })
    }
}

pub struct StartedServer {
    pub addr: SocketAddr,
    pub table: PreferenceTable,
    handle: Option<tokio::task::JoinHandle<anyhow::Result<()>>>,
}

impl StartedServer {
    /// Base url of the preference resource, suitable for `QUARRY_PREFERENCE_ENDPOINT`.
    pub fn preference_endpoint(&self) -> String {
        format!("http://{}{PREFERENCE_PATH}", self.addr)
    }

    pub async fn wait(self) -> anyhow::Result<()> {
        let mut this = self;
        let handle = this.handle.take().context("server task already consumed")?;

        handle
            .await
            .context("server task panicked")?
            .context("server failed")?;
        Ok(())
    }
}

impl Drop for StartedServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub async fn start_server(addr: SocketAddr) -> anyhow::Result<StartedServer> {
    start_server_with_table(addr, PreferenceTable::new()).await
}

pub async fn start_server_with_table(
    addr: SocketAddr,
    table: PreferenceTable,
) -> anyhow::Result<StartedServer> {
    let app = preference_service::router(table.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let actual = listener.local_addr().context("failed to read local addr")?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.context("server failed")?;
        Ok(())
    });

    Ok(StartedServer {
        addr: actual,
        table,
        handle: Some(handle),
    })
}
