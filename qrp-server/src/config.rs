use std::env;
use std::path::PathBuf;

use qrp_blob::{StoreError, StoreResult};

/// Application settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    /// Store connection target (`STORE_ROOT`); required for the store open
    pub store_root: Option<String>,
    /// Store name under the target (`STORE_NAME`); required for the store open
    pub store_name: Option<String>,
    /// Bearer token guarding mutating project routes (`AUTH_TOKEN`)
    pub auth_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("HTTP_PORT").unwrap_or_else(|_| "3000".to_string());

        Self {
            host,
            port,
            store_root: env::var("STORE_ROOT").ok().filter(|v| !v.is_empty()),
            store_name: env::var("STORE_NAME").ok().filter(|v| !v.is_empty()),
            auth_token: env::var("AUTH_TOKEN").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Resolve the store connection pair, failing with a descriptive
    /// connection error when either half is missing.
    pub fn store_target(&self) -> StoreResult<(PathBuf, &str)> {
        let root = self
            .store_root
            .as_deref()
            .ok_or_else(|| StoreError::connection("Missing STORE_ROOT"))?;
        let name = self
            .store_name
            .as_deref()
            .ok_or_else(|| StoreError::connection("Missing STORE_NAME"))?;
        Ok((PathBuf::from(root), name))
    }
}
