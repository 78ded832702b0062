//! URL shortening for links handed out in exports and messages.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::warn;

const TINYURL_API: &str = "https://tinyurl.com/api-create.php";

#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> Result<String>;
}

/// TinyURL's keyless endpoint: `GET api-create.php?url=...` answers with the
/// short link as plain text.
#[derive(Debug, Clone)]
pub struct TinyUrlClient {
    http: Client,
    endpoint: Url,
}

impl TinyUrlClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(Url::parse(TINYURL_API).context("invalid TinyURL endpoint")?)
    }

    pub fn with_endpoint(endpoint: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent("eventdesk/0.1")
            .build()
            .context("failed to build shortener HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn request_url(&self, long_url: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("url", long_url);
        url
    }
}

#[async_trait]
impl UrlShortener for TinyUrlClient {
    async fn shorten(&self, long_url: &str) -> Result<String> {
        let res = self
            .http
            .get(self.request_url(long_url))
            .send()
            .await
            .context("failed to reach URL shortener")?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(%status, "URL shortener error");
            return Err(anyhow!("shortener error {}: {}", status, body));
        }
        let short = body.trim();
        if !short.starts_with("http") {
            return Err(anyhow!("unexpected shortener response: {short}"));
        }
        Ok(short.to_string())
    }
}
