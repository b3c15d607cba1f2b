//! # Catalog Library Module
//!
//! Owns the release catalog database and provides repository patterns for
//! data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling and embedded migrations
//! - The release writer: one transaction per release, idempotent on the
//!   release id
//! - Aggregate queries over the stored artists, styles and genres

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
