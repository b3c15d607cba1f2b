//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//!
//! ## Available Repositories
//!
//! - `ReleaseRepository` - Transactional release writer and lookups
//! - `StatsRepository` - Aggregate counts and distinct attribute names

pub mod release;
pub mod stats;

pub use release::{ReleaseRepository, SqliteReleaseRepository};
pub use stats::{SqliteStatsRepository, StatsRepository};
