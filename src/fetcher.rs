//! Conditional, ETag-aware fetching of upstream payloads.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, ETAG};
use reqwest::Response;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

/// HTTP client and request quota shared by every fetcher of the process.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .pool_max_idle_per_host(5)
            .build()?;

        // Config rejects a zero quota; MIN is only a fallback for direct callers.
        let per_minute = NonZeroU32::new(config.upstream_requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            http_client,
            rate_limiter,
        })
    }
}

/// Last full payload together with the freshness token it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    pub token: String,
    pub payload: String,
}

/// Fetches one endpoint, skipping the body download when its ETag is unchanged.
pub struct ConditionalFetcher {
    url: String,
    client: UpstreamClient,
    cache: Option<CachedPayload>,
}

impl ConditionalFetcher {
    pub fn new(url: impl Into<String>, client: UpstreamClient) -> Self {
        Self {
            url: url.into(),
            client,
            cache: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cached(&self) -> Option<&CachedPayload> {
        self.cache.as_ref()
    }

    /// One HEAD request, then a GET only if the payload may have changed.
    ///
    /// No retries; the caller decides what a failed fetch means.
    pub async fn fetch(&mut self) -> Result<String, FetchError> {
        let token = self.freshness_token().await?;

        if let (Some(token), Some(cached)) = (token.as_deref(), self.cache.as_ref()) {
            if cached.token == token {
                debug!(url = %self.url, token, "Payload unchanged, serving cached copy");
                return Ok(cached.payload.clone());
            }
        }

        let (payload, token) = self.retrieve().await?;
        debug!(
            url = %self.url,
            token = token.as_deref().unwrap_or("-"),
            bytes = payload.len(),
            "Fetched fresh payload"
        );

        // Without a token there is nothing to validate a cached copy against.
        self.cache = token.map(|token| CachedPayload {
            token,
            payload: payload.clone(),
        });
        Ok(payload)
    }

    async fn freshness_token(&self) -> Result<Option<String>, FetchError> {
        self.client.rate_limiter.until_ready().await;

        let response = self
            .client
            .http_client
            .head(&self.url)
            .send()
            .await
            .map_err(|source| self.transport(source))?;
        let response = self.ensure_success(response)?;

        Ok(etag(response.headers()))
    }

    async fn retrieve(&self) -> Result<(String, Option<String>), FetchError> {
        self.client.rate_limiter.until_ready().await;

        let response = self
            .client
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| self.transport(source))?;
        let response = self.ensure_success(response)?;

        let token = etag(response.headers());
        let body = response
            .text()
            .await
            .map_err(|source| self.transport(source))?;

        Ok((body, token))
    }

    fn ensure_success(&self, response: Response) -> Result<Response, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }
        Ok(response)
    }

    fn transport(&self, source: reqwest::Error) -> FetchError {
        FetchError::Transport {
            url: self.url.clone(),
            source,
        }
    }
}

fn etag(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|token| !token.is_empty())
}
