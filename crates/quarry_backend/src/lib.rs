mod config;
mod env;
mod http_gateway;
mod services;
mod sqlite_cache;
#[cfg(test)]
mod test_support;
mod time;
mod wire;

pub use config::{
    AUTH_TOKEN_ENV, BackendConfig, CACHE_DB_ENV, DEFAULT_PREFERENCE_ENDPOINT,
    PREFERENCE_ENDPOINT_ENV, ROOT_ENV,
};
pub use env::optional_trimmed_from_env;
pub use http_gateway::HttpPreferenceGateway;
pub use services::BackendServices;
pub use sqlite_cache::SqliteLocalCache;
