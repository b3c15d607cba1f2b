//! External Catalog Providers
//!
//! Clients for upstream music-metadata services. Each provider handles its
//! own authentication headers and rate-limit signalling.

pub mod discogs;

pub use discogs::DiscogsClient;
