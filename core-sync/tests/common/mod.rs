//! Shared fakes for core-sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::time::{Clock, Sleeper};
use chrono::{DateTime, Utc};
use core_metadata::DiscogsClient;
use core_runtime::config::ApiConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://api.test";

/// HTTP client answering from per-URL queues of scripted responses
///
/// The last response queued for a URL repeats. Unscripted URLs answer 404;
/// URLs marked with [`ScriptedHttpClient::fail_transport`] fail before any
/// response is produced.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    broken: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn json(&self, url: &str, status: u16, body: Value) {
        self.respond(url, HttpResponse::new(status, body.to_string()));
    }

    pub fn fail_transport(&self, url: &str) {
        self.broken.lock().unwrap().push(url.to_string());
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.url.clone());

        if self.broken.lock().unwrap().contains(&request.url) {
            return Err(BridgeError::Connection("connection refused".to_string()));
        }

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| HttpResponse::new(404, "not scripted")))
    }
}

/// Clock and sleeper sharing one virtual timeline
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
) -> Arc<DiscogsClient> {
    let api = ApiConfig {
        base_url: BASE_URL.to_string(),
        ..ApiConfig::default()
    };

    Arc::new(DiscogsClient::new(http, time.clone(), &api, policy).with_clock(time))
}

pub fn page_url(label_id: i64, page: u32) -> String {
    format!(
        "{}/labels/{}/releases?page={}&per_page=100",
        BASE_URL, label_id, page
    )
}

pub fn release_url(id: i64) -> String {
    format!("{}/releases/{}", BASE_URL, id)
}

/// Script a listing with one page per group of release ids
pub fn script_listing(http: &ScriptedHttpClient, label_id: i64, pages: &[&[i64]]) {
    for (index, ids) in pages.iter().enumerate() {
        let page = index as u32 + 1;
        let next = if index + 1 < pages.len() {
            Value::String(page_url(label_id, page + 1))
        } else {
            Value::Null
        };
        let releases: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "resource_url": release_url(*id)}))
            .collect();

        http.json(
            &page_url(label_id, page),
            200,
            json!({
                "pagination": {"page": page, "pages": pages.len(), "urls": {"next": next}},
                "releases": releases
            }),
        );
    }
}

/// Script a release detail document
pub fn script_release(
    http: &ScriptedHttpClient,
    id: i64,
    artists: &[&str],
    styles: &[&str],
    genres: &[&str],
) {
    let artists: Vec<Value> = artists.iter().map(|name| json!({"name": name})).collect();
    http.json(
        &release_url(id),
        200,
        json!({"id": id, "artists": artists, "styles": styles, "genres": genres}),
    );
}
