use crate::{BackendConfig, HttpPreferenceGateway, SqliteLocalCache};
use anyhow::Context as _;
use quarry_domain::{LocalCache, PreferenceGateway};
use std::sync::Arc;

/// The remote gateway and the local cache, wired from one config.
#[derive(Clone)]
pub struct BackendServices {
    pub gateway: Arc<dyn PreferenceGateway>,
    pub cache: Arc<dyn LocalCache>,
}

impl BackendServices {
    pub fn open(config: &BackendConfig) -> anyhow::Result<Self> {
        let gateway = HttpPreferenceGateway::new(
            &config.preference_endpoint,
            config.auth_token.clone(),
        )
        .context("failed to init preference gateway")?;
        let cache = SqliteLocalCache::new(config.cache_db_path.clone())
            .context("failed to init local cache")?;

        tracing::info!(
            endpoint = %gateway.endpoint(),
            cache_db = %config.cache_db_path.display(),
            "backend services ready"
        );

        Ok(Self {
            gateway: Arc::new(gateway),
            cache: Arc::new(cache),
        })
    }
}
