//! # Host Bridge Traits
//!
//! Capability traits the catalog core depends on but does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the ingestion core and the
//! concrete adapters that talk to the outside world. Production adapters live
//! in `bridge-desktop`; tests supply scripted fakes.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`Sleeper`](time::Sleeper) - Injectable delay used by retry loops
//!
//! Retry decisions are data, not behavior: callers consult a
//! [`RetryPolicy`](http::RetryPolicy) between attempts.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and keep the original message as context.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared across
//! async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{Backoff, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, Sleeper, SystemClock};
