//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the catalog core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the explicit configuration
//! object that is built once at startup and passed down by reference.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
