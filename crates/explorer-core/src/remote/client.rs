use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde_json::Value;

use super::{FetchError, RemoteSource};
use crate::config::CoreConfig;
use crate::models::{parse_catalog, CatalogParse, UserStatus};

const USER_AGENT: &str = concat!("steam-explorer/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in a `FetchError::Status`
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for the store's catalog and user status endpoints
pub struct SteamClient {
    client: reqwest::Client,
    catalog_url: String,
    user_status_url: String,
    user_status_cookie: Option<String>,
}

impl SteamClient {
    pub fn new(config: &CoreConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &CoreConfig) -> Self {
        Self {
            client,
            catalog_url: config.catalog_url.clone(),
            user_status_url: config.user_status_url.clone(),
            user_status_cookie: config.user_status_cookie.clone(),
        }
    }

    async fn get_json(&self, url: &str, cookie: Option<&str>) -> Result<Value, FetchError> {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let mut body = response.text().await.unwrap_or_default();
            if let Some((cut, _)) = body.char_indices().nth(MAX_ERROR_BODY) {
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| FetchError::InvalidBody {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RemoteSource for SteamClient {
    async fn fetch_catalog(&self) -> Result<CatalogParse, FetchError> {
        let doc = self.get_json(&self.catalog_url, None).await?;
        let parsed = parse_catalog(&doc).map_err(|reason| FetchError::UnexpectedShape {
            url: self.catalog_url.clone(),
            reason: reason.to_string(),
        })?;

        if parsed.rejected > 0 {
            tracing::warn!("Dropped {} malformed catalog entries", parsed.rejected);
        }
        tracing::info!("Fetched catalog with {} entries", parsed.items.len());
        Ok(parsed)
    }

    async fn fetch_user_status(&self) -> Result<UserStatus, FetchError> {
        let doc = self
            .get_json(&self.user_status_url, self.user_status_cookie.as_deref())
            .await?;
        let status = UserStatus::from_document(doc).map_err(|e| FetchError::UnexpectedShape {
            url: self.user_status_url.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            "Fetched user status: {} owned, {} ignored, {} wishlisted",
            status.owned.len(),
            status.ignored.len(),
            status.wishlisted.len()
        );
        Ok(status)
    }
}
