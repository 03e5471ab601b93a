//! HTTP client for the BMKG nowcast API.
//!
//! The list endpoint returns a flat `{data: [...], meta: {...}}` envelope; the
//! detail endpoint wraps its payload one level deeper as `{data: {...}, meta:
//! {...}}`. Both envelopes are unwrapped here so the rest of the engine only ever
//! sees `NowcastSummary`/`NowcastDetail`.

use alert_core::error::{Error, Result};
use alert_core::upstream::UpstreamClient;
use alert_core::warning::{NowcastDetail, NowcastSummary};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct NowcastListResponse {
    data: Vec<NowcastSummary>,
}

#[derive(Debug, Deserialize)]
struct NowcastDetailResponse {
    data: NowcastDetail,
}

pub struct HttpUpstreamClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpUpstreamClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build upstream http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        let base = Url::parse(&self.base_url).context("parse upstream base URL")?;
        base.join(path).context("join upstream URL")
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn list_nowcast(&self) -> Result<Vec<NowcastSummary>> {
        let url = self.url("/v1/nowcast").map_err(Error::from)?;
        tracing::info!(event = "alert_upstream.request", endpoint = "/v1/nowcast");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("GET /v1/nowcast")
            .map_err(Error::from)?
            .error_for_status()
            .context("/v1/nowcast status")
            .map_err(Error::from)?;

        let body: NowcastListResponse = resp
            .json()
            .await
            .context("decode /v1/nowcast")
            .map_err(Error::from)?;

        tracing::info!(
            event = "alert_upstream.response",
            endpoint = "/v1/nowcast",
            count = body.data.len(),
        );
        Ok(body.data)
    }

    async fn fetch_detail(&self, code: &str) -> Result<NowcastDetail> {
        let url = self
            .url(&format!("/v1/nowcast/{code}"))
            .map_err(Error::from)?;
        tracing::debug!(event = "alert_upstream.request", code);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET /v1/nowcast/{code}"))
            .map_err(Error::from)?
            .error_for_status()
            .with_context(|| format!("/v1/nowcast/{code} status"))
            .map_err(Error::from)?;

        let body: NowcastDetailResponse = resp
            .json()
            .await
            .with_context(|| format!("decode /v1/nowcast/{code}"))
            .map_err(Error::from)?;

        Ok(body.data)
    }
}
