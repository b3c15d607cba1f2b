//! Shared fakes for core-metadata integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::time::{Clock, Sleeper};
use chrono::{DateTime, Utc};
use core_metadata::DiscogsClient;
use core_runtime::config::ApiConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://api.test";

pub enum Reply {
    Response(HttpResponse),
    TransportError(String),
}

/// HTTP client answering from per-URL queues of scripted replies
///
/// The last reply queued for a URL is repeated once the queue is drained.
/// Unscripted URLs answer 404.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, url: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn json(&self, url: &str, status: u16, body: serde_json::Value) {
        self.reply(url, Reply::Response(HttpResponse::new(status, body.to_string())));
    }

    pub fn rate_limited(&self, url: &str, remaining: &str) {
        let response = HttpResponse::new(429, "")
            .with_header("x-discogs-ratelimit", "60")
            .with_header("x-discogs-ratelimit-used", "60")
            .with_header("x-discogs-ratelimit-remaining", remaining);
        self.reply(url, Reply::Response(response));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&url) else {
            return Ok(HttpResponse::new(404, "not scripted"));
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|reply| match reply {
                Reply::Response(response) => Reply::Response(response.clone()),
                Reply::TransportError(message) => Reply::TransportError(message.clone()),
            })
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::TransportError(message)) => Err(BridgeError::Connection(message)),
            None => Ok(HttpResponse::new(404, "not scripted")),
        }
    }
}

/// Clock and sleeper sharing one virtual timeline
///
/// Sleeping records the requested delay and advances the clock by it.
pub struct FakeTime {
    now_ms: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeTime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicI64::new(1_700_000_000_000),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for FakeTime {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.unix_timestamp_millis()).unwrap_or_default()
    }

    fn unix_timestamp_millis(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for FakeTime {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.now_ms
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }
}

pub fn discogs_client(
    http: Arc<ScriptedHttpClient>,
    time: Arc<FakeTime>,
    policy: RetryPolicy,
) -> DiscogsClient {
    let api = ApiConfig {
        base_url: BASE_URL.to_string(),
        ..ApiConfig::default()
    };

    DiscogsClient::new(http, time.clone(), &api, policy).with_clock(time)
}

pub fn listing_url(label_id: i64) -> String {
    format!("{}/labels/{}/releases?page=1&per_page=100", BASE_URL, label_id)
}

pub fn release_url(id: i64) -> String {
    format!("{}/releases/{}", BASE_URL, id)
}
