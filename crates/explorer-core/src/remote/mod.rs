//! Fetchers for the two remote datasets.

pub mod client;

use async_trait::async_trait;

use crate::models::{CatalogParse, UserStatus};

pub use client::SteamClient;

/// A failed fetch. The caller keeps using whatever it had cached.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{url} returned an invalid JSON body: {source}")]
    InvalidBody {
        url: String,
        source: serde_json::Error,
    },

    #[error("{url} returned an unexpected document: {reason}")]
    UnexpectedShape { url: String, reason: String },
}

/// One network round trip per call; a fetch either fully succeeds or fails.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<CatalogParse, FetchError>;

    async fn fetch_user_status(&self) -> Result<UserStatus, FetchError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::CatalogItem;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned responses and counts calls.
    #[derive(Default)]
    pub(crate) struct ScriptedRemote {
        pub(crate) catalog: Mutex<Option<Vec<CatalogItem>>>,
        pub(crate) status: Mutex<Option<UserStatus>>,
        pub(crate) catalog_calls: AtomicUsize,
        pub(crate) status_calls: AtomicUsize,
    }

    fn offline(what: &str) -> FetchError {
        FetchError::UnexpectedShape {
            url: format!("test://{}", what),
            reason: "offline".to_string(),
        }
    }

    impl ScriptedRemote {
        pub(crate) fn new(catalog: Vec<CatalogItem>, status: UserStatus) -> Self {
            Self {
                catalog: Mutex::new(Some(catalog)),
                status: Mutex::new(Some(status)),
                ..Default::default()
            }
        }

        /// Make every later fetch fail.
        pub(crate) fn go_offline(&self) {
            *self.catalog.lock() = None;
            *self.status.lock() = None;
        }

        pub(crate) fn catalog_calls(&self) -> usize {
            self.catalog_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteSource for ScriptedRemote {
        async fn fetch_catalog(&self) -> Result<CatalogParse, FetchError> {
            self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            let items = self.catalog.lock().clone().ok_or_else(|| offline("catalog"))?;
            Ok(CatalogParse { items, rejected: 0 })
        }

        async fn fetch_user_status(&self) -> Result<UserStatus, FetchError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.status.lock().clone().ok_or_else(|| offline("status"))
        }
    }
}
