// src/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;

/// Socket-level backstop applied to every network operation. Nothing in the
/// core has a finer-grained timeout; the resolver's retry budget is the only
/// other bound.
const NETWORK_TIMEOUT: Duration = Duration::from_secs(300);

/// Redirect hops reqwest may follow on a single fetch. The resolver re-walks
/// from the landing URL until the canonical pattern shows up, so one fetch
/// does not need to reach the end of the chain.
const REDIRECT_CAP: usize = 10;

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Terminal location this fetch reached after its (capped) redirects.
    pub final_url: String,
    pub body: String,
}

/// External page-fetch capability. Everything that touches the network in
/// the pipeline goes through this seam, so tests can script responses.
#[async_trait]
pub trait PageFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(NETWORK_TIMEOUT)
            .redirect(redirect::Policy::limited(REDIRECT_CAP))
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        Ok(FetchResponse {
            status,
            final_url,
            body,
        })
    }
}
