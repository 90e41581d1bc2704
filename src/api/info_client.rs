//! Hyperliquid info API client for spot metadata and asset contexts.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::mirror::SpotMetadataSource;

use super::types::{InfoRequest, SpotMeta, SpotMetaAndAssetCtxs};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the read-only `/info` endpoint.
pub struct InfoClient {
    client: Client,
    base_url: String,
}

impl InfoClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_info<T: DeserializeOwned>(&self, request: InfoRequest) -> Result<T> {
        let url = format!("{}/info", self.base_url);

        debug!(url = %url, request = ?request, "Fetching info");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send {:?} request", request))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Info request {:?} failed: {} - {}", request, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {:?} response", request))
    }
}

#[async_trait]
impl SpotMetadataSource for InfoClient {
    async fn spot_meta(&self) -> Result<SpotMeta> {
        self.post_info(InfoRequest::SpotMeta).await
    }

    async fn spot_meta_and_asset_ctxs(&self) -> Result<SpotMetaAndAssetCtxs> {
        self.post_info(InfoRequest::SpotMetaAndAssetCtxs).await
    }
}
