use crate::env::{optional_trimmed_from_env, optional_trimmed_path_from_env};
use anyhow::anyhow;
use std::path::PathBuf;

pub const PREFERENCE_ENDPOINT_ENV: &str = "QUARRY_PREFERENCE_ENDPOINT";
pub const AUTH_TOKEN_ENV: &str = "QUARRY_AUTH_TOKEN";
pub const CACHE_DB_ENV: &str = "QUARRY_CACHE_DB";
pub const ROOT_ENV: &str = "QUARRY_ROOT";

pub const DEFAULT_PREFERENCE_ENDPOINT: &str = "http://127.0.0.1:8422/user-api/user-preference";
const CACHE_DB_FILE_NAME: &str = "local-cache.db";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendConfig {
    pub preference_endpoint: String,
    pub auth_token: Option<String>,
    pub cache_db_path: PathBuf,
}

impl BackendConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let preference_endpoint = optional_trimmed_from_env(PREFERENCE_ENDPOINT_ENV)?
            .unwrap_or_else(|| DEFAULT_PREFERENCE_ENDPOINT.to_owned());
        let auth_token = optional_trimmed_from_env(AUTH_TOKEN_ENV)?;
        let cache_db_path = match optional_trimmed_path_from_env(CACHE_DB_ENV)? {
            Some(path) => path,
            None => resolve_root()?.join(CACHE_DB_FILE_NAME),
        };

        Ok(Self {
            preference_endpoint,
            auth_token,
            cache_db_path,
        })
    }
}

fn resolve_root() -> anyhow::Result<PathBuf> {
    if let Some(root) = optional_trimmed_path_from_env(ROOT_ENV)? {
        return Ok(root);
    }
    let home = std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .ok_or_else(|| anyhow!("HOME is not set; set {ROOT_ENV} or {CACHE_DB_ENV}"))?;
    Ok(PathBuf::from(home).join(".quarry"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EnvVarGuard, lock_env};

    #[test]
    fn defaults_endpoint_and_derives_cache_from_root() {
        let _lock = lock_env();
        let _endpoint = EnvVarGuard::remove(PREFERENCE_ENDPOINT_ENV);
        let _token = EnvVarGuard::remove(AUTH_TOKEN_ENV);
        let _cache = EnvVarGuard::remove(CACHE_DB_ENV);
        let _root = EnvVarGuard::set(ROOT_ENV, "/tmp/quarry-root");

        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.preference_endpoint, DEFAULT_PREFERENCE_ENDPOINT);
        assert_eq!(config.auth_token, None);
        assert_eq!(
            config.cache_db_path,
            PathBuf::from("/tmp/quarry-root/local-cache.db")
        );
    }

    #[test]
    fn explicit_values_win() {
        let _lock = lock_env();
        let _endpoint = EnvVarGuard::set(PREFERENCE_ENDPOINT_ENV, " http://prefs.test/api ");
        let _token = EnvVarGuard::set(AUTH_TOKEN_ENV, "secret");
        let _cache = EnvVarGuard::set(CACHE_DB_ENV, "/var/tmp/cache.db");
        let _root = EnvVarGuard::set(ROOT_ENV, "/ignored");

        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.preference_endpoint, "http://prefs.test/api");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.cache_db_path, PathBuf::from("/var/tmp/cache.db"));
    }

    #[test]
    fn empty_token_is_an_error() {
        let _lock = lock_env();
        let _token = EnvVarGuard::set(AUTH_TOKEN_ENV, "  ");

        let err = BackendConfig::from_env().unwrap_err();
        assert!(err.to_string().contains(AUTH_TOKEN_ENV));
    }
}
