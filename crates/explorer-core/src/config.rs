use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATALOG_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TTL_SECS, STORE_ORIGIN, USER_STATUS_URL,
};
use crate::models::EntryId;

/// Which unseen selections an activation computes and surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Next,
    Random,
    Both,
}

impl SelectionMode {
    pub fn wants_next(&self) -> bool {
        matches!(self, Self::Next | Self::Both)
    }

    pub fn wants_random(&self) -> bool {
        matches!(self, Self::Random | Self::Both)
    }
}

/// Core configuration, loadable from a JSON file. Every field has a default,
/// so `{}` is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub catalog_url: String,
    pub user_status_url: String,
    /// Origin used to build navigation links
    pub origin: String,
    pub catalog_ttl_secs: u64,
    pub user_status_ttl_secs: u64,
    /// Highest id `next_unseen` may return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_ceiling: Option<EntryId>,
    /// Cookie header sent to the user status endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_status_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub selection: SelectionMode,
    /// Keep entries marked seen across catalog rebuilds
    pub preserve_seen_on_refresh: bool,
}

impl CoreConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("explorer.db")
    }

    pub fn kv_path(&self) -> PathBuf {
        self.data_dir.join("cache.json")
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn user_status_ttl(&self) -> Duration {
        Duration::from_secs(self.user_status_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("steam-explorer");

        Self {
            data_dir,
            catalog_url: CATALOG_URL.to_string(),
            user_status_url: USER_STATUS_URL.to_string(),
            origin: STORE_ORIGIN.to_string(),
            catalog_ttl_secs: DEFAULT_TTL_SECS,
            user_status_ttl_secs: DEFAULT_TTL_SECS,
            id_ceiling: None,
            user_status_cookie: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            selection: SelectionMode::default(),
            preserve_seen_on_refresh: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
