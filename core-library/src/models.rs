//! Domain models for the release catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

pub use core_runtime::config::AttributeWriteMode;

// =============================================================================
// Release
// =============================================================================

/// A release with its normalized attributes
///
/// The id is the upstream catalog id and doubles as the primary key. Any of
/// the attribute lists may be empty; their order is the order the upstream
/// document listed them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    id: i64,
    artists: Vec<String>,
    styles: Vec<String>,
    genres: Vec<String>,
}

impl Release {
    pub fn new(id: i64, artists: Vec<String>, styles: Vec<String>, genres: Vec<String>) -> Self {
        Self {
            id,
            artists,
            styles,
            genres,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Names stored under the given attribute kind
    pub fn attributes(&self, kind: AttributeKind) -> &[String] {
        match kind {
            AttributeKind::Artist => &self.artists,
            AttributeKind::Style => &self.styles,
            AttributeKind::Genre => &self.genres,
        }
    }

    /// Total number of attribute rows this release produces
    pub fn attribute_count(&self) -> usize {
        self.artists.len() + self.styles.len() + self.genres.len()
    }
}

// =============================================================================
// Attribute kinds
// =============================================================================

/// Kinds of normalized attribute attached to a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Artist,
    Style,
    Genre,
}

impl AttributeKind {
    /// Insert order used by the release writer
    pub const WRITE_ORDER: [AttributeKind; 3] =
        [AttributeKind::Artist, AttributeKind::Genre, AttributeKind::Style];

    /// Table holding rows of this kind
    pub fn table_name(self) -> &'static str {
        match self {
            AttributeKind::Artist => "artists",
            AttributeKind::Style => "styles",
            AttributeKind::Genre => "genres",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Artist => write!(f, "artist"),
            AttributeKind::Style => write!(f, "style"),
            AttributeKind::Genre => write!(f, "genre"),
        }
    }
}

impl FromStr for AttributeKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "artist" | "artists" => Ok(AttributeKind::Artist),
            "style" | "styles" => Ok(AttributeKind::Style),
            "genre" | "genres" => Ok(AttributeKind::Genre),
            other => Err(LibraryError::InvalidInput {
                field: "AttributeKind".to_string(),
                message: format!("unknown attribute kind '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Write results
// =============================================================================

/// What one call to the release writer changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOutcome {
    pub release_id: i64,
    /// `false` when the release row already existed
    pub created: bool,
    /// Attribute rows inserted by this call
    pub attributes_written: u64,
    /// Attribute rows removed first (replace mode only)
    pub attributes_replaced: u64,
}

// =============================================================================
// Read side
// =============================================================================

/// Case-insensitive substring filters for aggregate queries
///
/// Empty strings are treated as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFilter {
    pub artist: Option<String>,
    pub style: Option<String>,
    pub genre: Option<String>,
}

impl ReleaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Filter value for a kind, if one is set and non-empty
    pub fn for_kind(&self, kind: AttributeKind) -> Option<&str> {
        let value = match kind {
            AttributeKind::Artist => self.artist.as_deref(),
            AttributeKind::Style => self.style.as_deref(),
            AttributeKind::Genre => self.genre.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        [AttributeKind::Artist, AttributeKind::Style, AttributeKind::Genre]
            .iter()
            .all(|kind| self.for_kind(*kind).is_none())
    }
}

/// Release counts for a filter, broken down by attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResult {
    /// Number of releases matching every filter
    pub release_count: u64,
    /// Matching releases per artist name
    pub artist_counts: BTreeMap<String, u64>,
    /// Matching releases per style name
    pub style_counts: BTreeMap<String, u64>,
    /// Matching releases per genre name
    pub genre_counts: BTreeMap<String, u64>,
}

impl CountResult {
    pub fn counts_mut(&mut self, kind: AttributeKind) -> &mut BTreeMap<String, u64> {
        match kind {
            AttributeKind::Artist => &mut self.artist_counts,
            AttributeKind::Style => &mut self.style_counts,
            AttributeKind::Genre => &mut self.genre_counts,
        }
    }
}
