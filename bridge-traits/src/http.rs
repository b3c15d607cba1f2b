//! HTTP Client Abstraction
//!
//! Provides a single-attempt async HTTP seam plus the retry policy callers use
//! to decide when and how long to back off. Implementations never retry on
//! their own: the retry loop lives with the caller so it can log upstream
//! telemetry and be exercised without a network.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// Status code upstream APIs use to signal backpressure
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Delay the catalog API asks well-behaved clients to wait after a 429
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Look up a header by name, ignoring ASCII case
    ///
    /// Transports normalize header names differently (reqwest lowercases
    /// them), so lookups must not depend on the casing the server used.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body as text, replacing invalid UTF-8
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the server asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        self.status == STATUS_TOO_MANY_REQUESTS
    }
}

/// How long to wait between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// `base * 2^(failures - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the given number of consecutive failures (1-based)
    pub fn delay_for(&self, failures: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(failures.saturating_sub(1));
                base.checked_mul(factor).unwrap_or(max).min(max)
            }
        }
    }
}

/// Retry policy configuration
///
/// `None` limits mean "no limit". The default policy waits a fixed
/// [`DEFAULT_RATE_LIMIT_DELAY`] and never gives up, which suits a slow-moving
/// upstream rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first attempt
    pub max_elapsed: Option<Duration>,
    /// Delay strategy between attempts
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry forever with a fixed delay
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            max_elapsed: None,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Retry at most `max_attempts` times in total
    pub fn bounded(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            max_elapsed: None,
            backoff,
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Decide whether another attempt is allowed
    ///
    /// `failures` is the number of attempts that have failed so far and
    /// `elapsed` the time since the first attempt started. Returns the delay
    /// to wait before the next attempt, or `None` when the policy is
    /// exhausted.
    pub fn next_delay(&self, failures: u32, elapsed: Duration) -> Option<Duration> {
        if let Some(max_attempts) = self.max_attempts {
            if failures >= max_attempts {
                return None;
            }
        }

        let delay = self.backoff.delay_for(failures);

        if let Some(max_elapsed) = self.max_elapsed {
            if elapsed.saturating_add(delay) > max_elapsed {
                return None;
            }
        }

        Some(delay)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.max_elapsed.is_none()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_RATE_LIMIT_DELAY)
    }
}

/// Async HTTP client trait
///
/// Executes exactly one request per call. Transport failures (DNS, connect,
/// TLS, timeouts) come back as `Err`; every HTTP status, including 4xx and
/// 5xx, comes back as `Ok` so callers can apply their own retry policy.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::get("https://api.example.com/data")
///         .header("Accept", "application/json");
///
///     let response = client.execute(request).await?;
///     Ok(response.text_lossy())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request once
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .header("Authorization", "Discogs key=k, secret=s")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert!(request.headers.contains_key("Authorization"));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse::new(200, "test");
        assert!(response.is_success());
        assert!(!response.is_rate_limited());

        let response = HttpResponse::new(429, "");
        assert!(!response.is_success());
        assert!(response.is_rate_limited());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response =
            HttpResponse::new(429, "").with_header("x-discogs-ratelimit-remaining", "0");

        assert_eq!(response.header("X-Discogs-Ratelimit-Remaining"), Some("0"));
        assert_eq!(response.header("X-Discogs-Ratelimit"), None);
    }

    #[test]
    fn test_default_policy_is_unbounded_fixed() {
        let policy = RetryPolicy::default();
        assert!(policy.is_unbounded());
        assert_eq!(
            policy.next_delay(1, Duration::ZERO),
            Some(DEFAULT_RATE_LIMIT_DELAY)
        );
        assert_eq!(
            policy.next_delay(10_000, Duration::from_secs(86_400)),
            Some(DEFAULT_RATE_LIMIT_DELAY)
        );
    }

    #[test]
    fn test_bounded_policy_stops_after_max_attempts() {
        let policy = RetryPolicy::bounded(3, Backoff::Fixed(Duration::from_millis(10)));

        assert_eq!(
            policy.next_delay(1, Duration::ZERO),
            Some(Duration::from_millis(10))
        );
        assert_eq!(
            policy.next_delay(2, Duration::ZERO),
            Some(Duration::from_millis(10))
        );
        assert_eq!(policy.next_delay(3, Duration::ZERO), None);
    }

    #[test]
    fn test_max_elapsed_limits_retries() {
        let policy =
            RetryPolicy::unbounded(Duration::from_secs(60)).with_max_elapsed(Duration::from_secs(90));

        assert_eq!(
            policy.next_delay(1, Duration::ZERO),
            Some(Duration::from_secs(60))
        );
        assert_eq!(policy.next_delay(2, Duration::from_secs(60)), None);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };

        assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(800));
        assert_eq!(backoff.delay_for(5), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(64), Duration::from_secs(1));
    }
}
