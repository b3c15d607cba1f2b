//! Discogs API Client
//!
//! Fetches label listings and release documents from the Discogs REST API.
//!
//! ## API Endpoints
//!
//! - **Label releases**: `{base}/labels/{label_id}/releases?page=1&per_page={n}`
//! - **Release detail**: the `resource_url` of each listing entry
//!
//! ## Rate Limiting
//!
//! Discogs answers `429 Too Many Requests` when the per-minute budget is
//! spent and reports the budget in `X-Discogs-Ratelimit`,
//! `X-Discogs-Ratelimit-Used` and `X-Discogs-Ratelimit-Remaining`. Transport
//! failures and 429 responses are retried according to the configured
//! [`RetryPolicy`]; every other non-2xx status fails immediately.
//!
//! ## Authentication
//!
//! - `User-Agent: {app_name}` when an application name is configured
//! - `Authorization: Discogs key={key}, secret={secret}` when both halves of
//!   the consumer credentials are configured
//!
//! Without either the client runs anonymously with a lower rate limit.

use crate::error::{MetadataError, Result};
use crate::extractor::decode_object;
use crate::types::{ListingPage, RawPayload, ReleaseReference};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::time::{Clock, Sleeper, SystemClock};
use core_runtime::config::{ApiConfig, ApiCredentials};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const HEADER_RATELIMIT: &str = "X-Discogs-Ratelimit";
pub const HEADER_RATELIMIT_USED: &str = "X-Discogs-Ratelimit-Used";
pub const HEADER_RATELIMIT_REMAINING: &str = "X-Discogs-Ratelimit-Remaining";

/// Discogs API client
///
/// All requests go through one retry loop that sleeps via the injected
/// [`Sleeper`] and measures elapsed time with the injected [`Clock`].
pub struct DiscogsClient {
    http_client: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    base_url: String,
    app_name: Option<String>,
    credentials: Option<ApiCredentials>,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl DiscogsClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
        api: &ApiConfig,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            sleeper,
            clock: Arc::new(SystemClock),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            app_name: api.app_name.clone(),
            credentials: api.credentials.clone(),
            request_timeout: api.request_timeout,
            retry_policy,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// URL of the first listing page for a label
    pub fn label_releases_url(&self, label_id: i64, page_size: u32) -> String {
        format!(
            "{}/labels/{}/releases?page=1&per_page={}",
            self.base_url, label_id, page_size
        )
    }

    /// Fetch one release detail document
    ///
    /// Returns the raw body; decoding is left to the extractor.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn fetch_release(&self, reference: &ReleaseReference) -> Result<RawPayload> {
        let response = self.get_with_retry(reference.as_str()).await?;
        Ok(response.body)
    }

    /// Fetch and decode one listing page
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, url: &str) -> Result<ListingPage> {
        let response = self.get_with_retry(url).await?;
        decode_object(&response.body, "listing page")
    }

    fn build_request(&self, url: &str) -> HttpRequest {
        let mut request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        if let Some(ref app_name) = self.app_name {
            request = request.header("User-Agent", app_name.as_str());
        }

        if let Some(ref credentials) = self.credentials {
            request = request.header("Authorization", credentials.authorization_header());
        }

        request
    }

    fn elapsed_since(&self, started_ms: i64) -> Duration {
        let elapsed_ms = self.clock.unix_timestamp_millis().saturating_sub(started_ms);
        Duration::from_millis(elapsed_ms.max(0) as u64)
    }

    /// GET `url` until it succeeds, fails permanently, or the policy gives up
    async fn get_with_retry(&self, url: &str) -> Result<HttpResponse> {
        let started_ms = self.clock.unix_timestamp_millis();
        let mut failures: u32 = 0;

        loop {
            let last_error = match self.http_client.execute(self.build_request(url)).await {
                Ok(response) if response.is_success() => {
                    debug!(
                        status = response.status,
                        attempts = failures + 1,
                        "API request succeeded"
                    );
                    return Ok(response);
                }
                Ok(response) if response.is_rate_limited() => {
                    warn!(
                        url,
                        ratelimit = response.header(HEADER_RATELIMIT).unwrap_or("-"),
                        ratelimit_used = response.header(HEADER_RATELIMIT_USED).unwrap_or("-"),
                        ratelimit_remaining =
                            response.header(HEADER_RATELIMIT_REMAINING).unwrap_or("-"),
                        "Rate limited by Discogs"
                    );
                    format!("HTTP {}", response.status)
                }
                Ok(response) => {
                    warn!(url, status = response.status, "API request failed");
                    return Err(MetadataError::Http {
                        status: response.status,
                        body: response.text_lossy(),
                    });
                }
                Err(e) => {
                    warn!(url, error = %e, "API request failed");
                    e.to_string()
                }
            };

            failures += 1;

            match self
                .retry_policy
                .next_delay(failures, self.elapsed_since(started_ms))
            {
                Some(delay) => {
                    warn!(
                        url,
                        attempt = failures,
                        delay_secs = delay.as_secs_f64(),
                        "Retrying after delay"
                    );
                    self.sleeper.sleep(delay).await;
                }
                None => {
                    warn!(url, attempts = failures, "Retry policy exhausted");
                    return Err(MetadataError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: failures,
                        last_error,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::Backoff;
    use mockall::mock;
    use mockall::predicate::*;
    use std::sync::Mutex;

    mock! {
        HttpClientMock {}

        #[async_trait]
        impl HttpClient for HttpClientMock {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    #[derive(Default)]
    struct NoopSleeper {
        calls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for NoopSleeper {
        async fn sleep(&self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    fn client(http: MockHttpClientMock, api: ApiConfig, policy: RetryPolicy) -> DiscogsClient {
        DiscogsClient::new(Arc::new(http), Arc::new(NoopSleeper::default()), &api, policy)
    }

    #[test]
    fn test_label_releases_url() {
        let api = ApiConfig {
            base_url: "https://api.discogs.com/".to_string(),
            ..ApiConfig::default()
        };
        let discogs = client(MockHttpClientMock::new(), api, RetryPolicy::default());

        assert_eq!(
            discogs.label_releases_url(1, 100),
            "https://api.discogs.com/labels/1/releases?page=1&per_page=100"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_identity_headers() {
        let mut http = MockHttpClientMock::new();
        http.expect_execute()
            .withf(|request| {
                request.headers.get("User-Agent").map(String::as_str) == Some("LabelCatalog/0.1")
                    && request.headers.get("Authorization").map(String::as_str)
                        == Some("Discogs key=k, secret=s")
                    && request.headers.get("Accept").map(String::as_str)
                        == Some("application/json")
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"id": 1}"#)));

        let api = ApiConfig {
            app_name: Some("LabelCatalog/0.1".to_string()),
            credentials: Some(ApiCredentials::new("k", "s")),
            ..ApiConfig::default()
        };
        let discogs = client(http, api, RetryPolicy::default());

        let body = discogs
            .fetch_release(&ReleaseReference::new("https://api.discogs.com/releases/1"))
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"id": 1}"#);
    }

    #[tokio::test]
    async fn test_anonymous_requests_omit_identity_headers() {
        let mut http = MockHttpClientMock::new();
        http.expect_execute()
            .withf(|request| {
                !request.headers.contains_key("User-Agent")
                    && !request.headers.contains_key("Authorization")
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "{}")));

        let discogs = client(http, ApiConfig::default(), RetryPolicy::default());

        assert!(discogs
            .fetch_release(&ReleaseReference::new("https://api.discogs.com/releases/1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut http = MockHttpClientMock::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "Release not found.")));

        let discogs = client(http, ApiConfig::default(), RetryPolicy::default());

        let result = discogs
            .fetch_release(&ReleaseReference::new("https://api.discogs.com/releases/404"))
            .await;

        match result {
            Err(MetadataError::Http { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Release not found.");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounded_policy_reports_exhaustion() {
        let mut http = MockHttpClientMock::new();
        http.expect_execute()
            .times(3)
            .returning(|_| Err(BridgeError::Connection("connection refused".to_string())));

        let policy = RetryPolicy::bounded(3, Backoff::Fixed(Duration::from_secs(1)));
        let discogs = client(http, ApiConfig::default(), policy);

        let result = discogs
            .fetch_release(&ReleaseReference::new("https://api.discogs.com/releases/1"))
            .await;

        match result {
            Err(MetadataError::RetriesExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("expected retries exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_object_body() {
        let mut http = MockHttpClientMock::new();
        http.expect_execute()
            .with(always())
            .returning(|_| Ok(HttpResponse::new(200, "[]")));

        let discogs = client(http, ApiConfig::default(), RetryPolicy::default());

        let result = discogs.fetch_page("https://api.discogs.com/labels/1/releases").await;
        assert!(matches!(result, Err(MetadataError::Decode { .. })));
    }
}
