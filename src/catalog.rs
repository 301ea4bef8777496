//! The in-memory song catalog and the loader that hydrates it from the static
//! JSON resource.
//!
//! Source data is parsed leniently: a broken section is skipped (and logged)
//! instead of rejecting the whole file, so one typo in a hymn does not take
//! the rest of the hymnal down with it.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Section, SectionType, Song};
use crate::route::Route;

/// Failures while fetching or decoding the catalog resource.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download catalog from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog is not a valid JSON song list")]
    Parse(#[from] serde_json::Error),
}

/// Where the catalog JSON lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// Interpret a command-line/config value: `http(s)://` means a download,
    /// anything else is a filesystem path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CatalogSource::Url(trimmed.to_string())
        } else {
            CatalogSource::File(PathBuf::from(trimmed))
        }
    }

    /// Fetch the raw JSON text.
    fn fetch(&self) -> Result<String, CatalogError> {
        match self {
            CatalogSource::File(path) => {
                fs::read_to_string(path).map_err(|source| CatalogError::Read {
                    path: path.clone(),
                    source,
                })
            }
            CatalogSource::Url(url) => reqwest::blocking::get(url)
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.text())
                .map_err(|source| CatalogError::Fetch {
                    url: url.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => f.write_str(url),
        }
    }
}

/// Outcome of resolving a route against the catalog. "Not found" is a state
/// of its own so the UI can tell it apart from "nothing requested".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongSelection<'a> {
    None,
    Found(&'a Song),
    NotFound(String),
}

/// Immutable, cheaply clonable list of songs. Clones share storage, which is
/// also what the search engine uses as the catalog's identity.
#[derive(Debug, Clone)]
pub struct Catalog {
    songs: Arc<[Song]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            songs: songs.into(),
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// True when both handles point at the same loaded song list.
    pub fn same_as(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.songs, &other.songs)
    }

    /// Look a song up by its path segment (the hymn number as a string).
    pub fn find_by_segment(&self, segment: &str) -> Option<&Song> {
        let segment = segment.trim();
        self.songs
            .iter()
            .find(|song| song.number.to_string() == segment)
    }

    pub fn resolve(&self, route: &Route) -> SongSelection<'_> {
        match route {
            Route::Home => SongSelection::None,
            Route::Song(segment) => match self.find_by_segment(segment) {
                Some(song) => SongSelection::Found(song),
                None => SongSelection::NotFound(segment.clone()),
            },
        }
    }

    /// Fetch and decode the catalog from `source`.
    pub fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        info!(%source, "loading catalog");
        let raw = source.fetch()?;
        let catalog = Self::from_json(&raw)?;
        info!(songs = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Decode a JSON array of songs, skipping malformed entries.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<RawSong> = serde_json::from_str(raw)?;
        let mut seen = HashSet::new();
        let mut songs = Vec::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let Some(song) = record.into_song(position) else {
                continue;
            };
            if !seen.insert(song.number) {
                warn!(number = song.number, "duplicate song number, keeping the first");
                continue;
            }
            songs.push(song);
        }

        Ok(Self::new(songs))
    }
}

/// Loose mirror of a catalog entry, used to validate field by field.
#[derive(Debug, Deserialize)]
struct RawSong {
    #[serde(default)]
    number: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    section_type: Option<String>,
    #[serde(default)]
    sort_index: Option<Value>,
    #[serde(default)]
    content: Option<Value>,
}

impl RawSong {
    fn into_song(self, position: usize) -> Option<Song> {
        let Some(number) = self.number.as_ref().and_then(integer_value) else {
            warn!(position, "song without a usable number skipped");
            return None;
        };

        let sections = self
            .sections
            .into_iter()
            .enumerate()
            .filter_map(|(idx, section)| section.into_section(number, idx))
            .collect();

        Some(Song {
            number,
            title: self.title.unwrap_or_default(),
            sections,
        })
    }
}

impl RawSection {
    fn into_section(self, number: i64, idx: usize) -> Option<Section> {
        let Some(content) = self.content.as_ref().and_then(Value::as_str) else {
            warn!(number, section = idx, "section without text content skipped");
            return None;
        };
        let Some(sort_index) = self.sort_index.as_ref().and_then(integer_value) else {
            warn!(number, section = idx, "section with a non-numeric sort_index skipped");
            return None;
        };
        let section_type = self
            .section_type
            .as_deref()
            .map(SectionType::from_tag)
            .unwrap_or(SectionType::Other);
        if section_type == SectionType::Other {
            debug!(number, section = idx, "untyped section kept as-is");
        }

        Some(Section {
            section_type,
            sort_index,
            content: content.to_string(),
        })
    }
}

/// Accept integers and integer-looking strings.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
