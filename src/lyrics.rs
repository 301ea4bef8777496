//! Line sequencing: turns a song's sections into the flat, indexable list of
//! lines that both the reading view and presentation mode walk over.

use crate::models::{Section, SectionType, Song};

/// Marker label used for the chorus.
pub const CHORUS_LABEL: &str = "Coro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Section heading ("Estrofa 1", "Coro"). Not a resting point while
    /// presenting.
    SectionMarker,
    Lyric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    pub fn marker(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::SectionMarker,
            text: text.into(),
        }
    }

    pub fn lyric(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Lyric,
            text: text.into(),
        }
    }

    pub fn is_marker(&self) -> bool {
        self.kind == LineKind::SectionMarker
    }
}

/// Heading shown above a section.
pub fn section_label(section: &Section) -> String {
    match section.section_type {
        SectionType::Chorus => CHORUS_LABEL.to_string(),
        SectionType::Verse => format!("Estrofa {}", section.sort_index),
        SectionType::Other => format!("Sección {}", section.sort_index),
    }
}

/// Flatten `song` into lines.
///
/// With `expand_chorus` the sections are walked in source order and the
/// chorus is repeated after every verse (the way it is sung). Without it,
/// sections are listed once each by `sort_index`. Blank lines never produce
/// a [`Line`].
pub fn flatten(song: &Song, expand_chorus: bool) -> Vec<Line> {
    let mut lines = Vec::new();

    if expand_chorus {
        let chorus = song.chorus();
        for section in &song.sections {
            match section.section_type {
                SectionType::Chorus => {}
                SectionType::Verse => {
                    push_section(&mut lines, section);
                    if let Some(chorus) = chorus {
                        push_section(&mut lines, chorus);
                    }
                }
                SectionType::Other => push_section(&mut lines, section),
            }
        }
    } else {
        let mut ordered: Vec<&Section> = song.sections.iter().collect();
        ordered.sort_by_key(|section| section.sort_index);
        for section in ordered {
            push_section(&mut lines, section);
        }
    }

    lines
}

fn push_section(lines: &mut Vec<Line>, section: &Section) {
    lines.push(Line::marker(section_label(section)));
    lines.extend(
        section
            .content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Line::lyric),
    );
}
