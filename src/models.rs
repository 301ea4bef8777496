//! Domain models for the hymn catalog. These types stay light-weight data
//! holders: the catalog owns them once loaded and every other layer (search,
//! line sequencing, rendering) only ever borrows or clones them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kind of a song section. Source data only ever uses `verse` and `chorus`;
/// anything else is kept as `Other` so its lyrics are not lost.
pub enum SectionType {
    Verse,
    Chorus,
    #[serde(other)]
    Other,
}

impl SectionType {
    /// Parse the loose `section_type` strings found in catalog files.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "verse" => SectionType::Verse,
            "chorus" => SectionType::Chorus,
            _ => SectionType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One block of lyrics inside a song.
pub struct Section {
    pub section_type: SectionType,
    /// Display ordering key for the reading view. Verses are labelled with it
    /// ("Estrofa 2"); the chorus ignores it.
    pub sort_index: i64,
    /// Raw lyric text, lines separated by `\n`.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A hymn as loaded from the catalog.
pub struct Song {
    /// Hymn number printed in the hymnal. Unique within a catalog and used as
    /// the routing key.
    pub number: i64,
    pub title: String,
    pub sections: Vec<Section>,
}

impl Song {
    /// `{number} - {title}`, the label used by result lists and headers.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            self.number.to_string()
        } else {
            format!("{} - {}", self.number, self.title)
        }
    }

    /// The logical chorus: the first section tagged as one.
    pub fn chorus(&self) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.section_type == SectionType::Chorus)
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}
