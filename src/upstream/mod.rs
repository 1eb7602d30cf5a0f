use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

pub mod model;

pub use model::{pick_collection, UpstreamBatch, DOCUMENT_FIELDS, LECTURE_FIELDS};

use model::AllBatchResp;

/// Read access to the remote catalog. The sync pass only talks to this trait,
/// so tests can substitute a recording double.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_batches(&self) -> Result<Vec<UpstreamBatch>>;

    /// Raw lecture payload for a batch (`{classes: [..]}` or `{data: [..]}`).
    async fn fetch_lectures(&self, batch_id: &str) -> Result<Value>;

    /// Raw document payload for a batch (`{topics: [..]}`).
    async fn fetch_documents(&self, batch_id: &str) -> Result<Value>;
}

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid upstream URL {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("upstream URL {} cannot be a base", base_url));
        }
        // Directory-style base path, e.g. /api/v1/.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(concat!("catalog-mirror/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.upstream.base_url, cfg.upstream_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments..}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("upstream URL cannot be a base"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "upstream request");
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("upstream {} returned {}: {}", url, status, body));
        }
        res.json::<T>()
            .await
            .with_context(|| format!("invalid JSON from {}", url))
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn list_batches(&self) -> Result<Vec<UpstreamBatch>> {
        let url = self.endpoint(&["allbatch"])?;
        let resp: AllBatchResp = self.get_json(url).await?;
        Ok(resp.into_batches())
    }

    async fn fetch_lectures(&self, batch_id: &str) -> Result<Value> {
        let url = self.endpoint(&["chapter", batch_id])?;
        self.get_json(url).await
    }

    async fn fetch_documents(&self, batch_id: &str) -> Result<Value> {
        let url = self.endpoint(&["pdf", batch_id])?;
        self.get_json(url).await
    }
}
