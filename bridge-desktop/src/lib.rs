//! # Desktop Bridge Implementations
//!
//! Production implementations of the bridge traits for native targets.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (one attempt per call, no built-in retry)
//! - `Sleeper` using the Tokio timer
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioSleeper};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = Arc::new(ReqwestHttpClient::new()?);
//!     let sleeper = Arc::new(TokioSleeper);
//!
//!     // Hand both to the catalog service
//!     Ok(())
//! }
//! ```

mod http;
mod sleeper;

pub use http::ReqwestHttpClient;
pub use sleeper::TokioSleeper;
