use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Mapset ids come back as numbers from search but some mirrors send strings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MapsetId {
    Number(u64),
    Text(String),
}

impl fmt::Display for MapsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapsetId::Number(id) => write!(f, "{}", id),
            MapsetId::Text(id) => f.write_str(id),
        }
    }
}

// Only the fields we print or download by; everything else in the payload is ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Beatmapset {
    pub id: MapsetId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub creator: Option<String>,
}

/// One response of the search endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub beatmapsets: Vec<Beatmapset>,
    #[serde(default)]
    pub cursor_string: Option<String>,
}

impl Page {
    pub fn from_body(url: &str, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.beatmapsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beatmapsets.is_empty()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RankStatus {
    Ranked,
    Loved,
    Qualified,
    Pending,
    Graveyard,
}

impl RankStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankStatus::Ranked => "ranked",
            RankStatus::Loved => "loved",
            RankStatus::Qualified => "qualified",
            RankStatus::Pending => "pending",
            RankStatus::Graveyard => "graveyard",
        }
    }
}

impl fmt::Display for RankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for the beatmapset search; mode 3 is mania, `keys` its key count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    pub mode: u8,
    pub keys: u8,
    pub status: RankStatus,
}

impl SearchQuery {
    pub fn new(mode: u8, keys: u8, status: RankStatus) -> Self {
        Self { mode, keys, status }
    }

    /// Full search URL without a cursor; the fetcher appends that per page.
    pub fn url(&self, api_base: &str) -> String {
        format!(
            "{}/api/v2/beatmapsets/search?m={}&q=key%3D{}&s={}&nsfw=",
            api_base.trim_end_matches('/'),
            self.mode,
            self.keys,
            self.status
        )
    }
}
