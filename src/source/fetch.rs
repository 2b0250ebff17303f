//! HTTP access for listings and avatar downloads.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Anything that can turn a URL into raw image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed client shared by every job in a run.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().context("build http client")?;
        Ok(Self { client })
    }

    /// GET `url` and decode a JSON body. `token` is sent as `Authorization: token <token>`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T> {
        let mut req = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = token {
            req = req.header("Authorization", format!("token {token}"));
        }
        let response = req.send().await.with_context(|| format!("request {url}"))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("failed to fetch data from {url}: {status} {body}"));
        }
        response.json::<T>().await.with_context(|| format!("decode json from {url}"))
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("avatar request returned {status}"));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(anyhow!("avatar response was empty"));
        }
        Ok(bytes.to_vec())
    }
}
