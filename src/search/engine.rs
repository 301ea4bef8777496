use tracing::debug;

use crate::catalog::Catalog;
use crate::models::Song;

use super::bitap::{span_len, Pattern, Span};
use super::normalize::fold;

/// Default permissiveness: loose enough for short queries against long lyric
/// bodies, tight enough to keep unrelated songs out.
pub const DEFAULT_THRESHOLD: f64 = 0.3;
/// Default cap on returned hits.
pub const DEFAULT_LIMIT: usize = 10;
/// Chars of context kept on each side of a highlighted span.
pub const DEFAULT_CONTEXT_CHARS: usize = 10;

/// Marker wrapped around every highlight excerpt.
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Normalized distance in `[0, 1]`; 0 only admits exact matches.
    pub threshold: f64,
    pub limit: usize,
    pub context_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub song: Song,
    /// Lyric excerpts around the match. At most one entry: the excerpt around
    /// the longest matched span of the lyric content.
    pub highlights: Vec<String>,
    /// Match distance, lower is better.
    pub score: f64,
}

/// Folded copy of one searchable text plus the original chars, so spans found
/// on the folded side can be sliced from the original.
#[derive(Debug)]
struct IndexedText {
    folded: Vec<char>,
    original: Vec<char>,
}

impl IndexedText {
    fn new(text: &str) -> Self {
        Self {
            folded: fold(text),
            original: text.chars().collect(),
        }
    }
}

#[derive(Debug)]
struct IndexedSong {
    number: Vec<char>,
    title: Vec<char>,
    sections: Vec<IndexedText>,
}

/// Search-ready view over one catalog.
#[derive(Debug)]
pub struct SearchIndex {
    catalog: Catalog,
    songs: Vec<IndexedSong>,
}

impl SearchIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let songs = catalog
            .songs()
            .iter()
            .map(|song| IndexedSong {
                number: fold(&song.number.to_string()),
                title: fold(&song.title),
                sections: song
                    .sections
                    .iter()
                    .map(|section| IndexedText::new(&section.content))
                    .collect(),
            })
            .collect();

        Self {
            catalog: catalog.clone(),
            songs,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rank the catalog against `query`, best match first.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let Some(pattern) = Pattern::new(&fold(query.trim())) else {
            return Vec::new();
        };

        let mut ranked: Vec<(usize, f64, Option<String>)> = Vec::new();
        for (position, entry) in self.songs.iter().enumerate() {
            let mut best: Option<f64> = None;
            let mut keep = |score: f64| {
                best = Some(best.map_or(score, |current: f64| current.min(score)));
            };

            for field in [&entry.number, &entry.title] {
                if let Some(found) = pattern.match_text(field, options.threshold) {
                    keep(found.score);
                }
            }

            let mut excerpt_source: Option<(&IndexedText, Span)> = None;
            for section in &entry.sections {
                let Some(found) = pattern.match_text(&section.folded, options.threshold) else {
                    continue;
                };
                keep(found.score);
                if let Some(span) = found.longest_span() {
                    let longer = excerpt_source
                        .map_or(true, |(_, current)| span_len(span) > span_len(current));
                    if longer {
                        excerpt_source = Some((section, span));
                    }
                }
            }

            if let Some(score) = best {
                let snippet = excerpt_source
                    .map(|(text, span)| excerpt(&text.original, span, options.context_chars));
                ranked.push((position, score, snippet));
            }
        }

        // Stable sort keeps catalog order between equal distances.
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(options.limit);

        let songs = self.catalog.songs();
        ranked
            .into_iter()
            .map(|(position, score, snippet)| SearchHit {
                song: songs[position].clone(),
                highlights: snippet.into_iter().collect(),
                score,
            })
            .collect()
    }
}

/// Cut the matched span plus context out of the original text, flattened to a
/// single line and wrapped in ellipses.
fn excerpt(original: &[char], (start, end): Span, context: usize) -> String {
    let from = start.saturating_sub(context);
    let to = (end + 1 + context).min(original.len());
    let window: String = original[from..to].iter().collect();
    let flat = window.replace("\r\n", " ").replace(['\n', '\r'], " ");
    format!("{ELLIPSIS}{flat}{ELLIPSIS}")
}

/// One-shot search: builds a throwaway index. Long-lived callers should hold
/// a [`SearchEngine`] instead.
pub fn search(query: &str, catalog: &Catalog, options: &SearchOptions) -> Vec<SearchHit> {
    SearchIndex::build(catalog).search(query, options)
}

/// Memoizing front of the search index. The index is rebuilt only when a
/// different catalog is passed in; hits are recomputed only when the trimmed
/// query or the catalog changes.
#[derive(Debug)]
pub struct SearchEngine {
    options: SearchOptions,
    index: Option<SearchIndex>,
    last: Option<(String, Vec<SearchHit>)>,
    index_builds: usize,
}

impl SearchEngine {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            index: None,
            last: None,
            index_builds: 0,
        }
    }

    /// How many times the index has been (re)built.
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }

    pub fn search(&mut self, catalog: &Catalog, query: &str) -> &[SearchHit] {
        let current = matches!(&self.index, Some(index) if index.catalog().same_as(catalog));
        if !current {
            debug!(songs = catalog.len(), "building search index");
            self.index = Some(SearchIndex::build(catalog));
            self.index_builds += 1;
            self.last = None;
        }

        let query = query.trim();
        let fresh = matches!(&self.last, Some((previous, _)) if previous == query);
        if !fresh {
            let hits = self
                .index
                .as_ref()
                .map(|index| index.search(query, &self.options))
                .unwrap_or_default();
            debug!(query, hits = hits.len(), "search recomputed");
            self.last = Some((query.to_string(), hits));
        }

        self.last
            .as_ref()
            .map(|(_, hits)| hits.as_slice())
            .unwrap_or_default()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Section, SectionType};

    fn song(number: i64, title: &str, verses: &[&str]) -> Song {
        Song {
            number,
            title: title.to_string(),
            sections: verses
                .iter()
                .enumerate()
                .map(|(idx, content)| Section {
                    section_type: SectionType::Verse,
                    sort_index: idx as i64 + 1,
                    content: content.to_string(),
                })
                .collect(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            song(1, "Santo, santo, santo", &["Señor omnipotente,\nsiempre el labio mío"]),
            song(2, "Himno de fe", &["Firmes y adelante"]),
            song(3, "Cuán grande es Él", &["Señor mi Dios, al contemplar los cielos"]),
            song(4, "Castillo fuerte", &["Castillo fuerte es nuestro Dios"]),
        ])
    }

    #[test]
    fn blank_queries_return_nothing() {
        let catalog = catalog();
        assert!(search("", &catalog, &SearchOptions::default()).is_empty());
        assert!(search("   \t", &catalog, &SearchOptions::default()).is_empty());
    }

    #[test]
    fn accents_do_not_matter() {
        let catalog = catalog();
        let plain = search("himno", &catalog, &SearchOptions::default());
        let accented = search("hímno", &catalog, &SearchOptions::default());
        assert_eq!(plain[0].song.number, 2);
        assert_eq!(plain, accented);
    }

    #[test]
    fn hits_are_sorted_and_capped() {
        let catalog = catalog();
        let options = SearchOptions {
            limit: 2,
            ..SearchOptions::default()
        };
        let hits = search("señor", &catalog, &options);
        assert_eq!(hits.len(), 2);
        assert!(hits.windows(2).all(|pair| pair[0].score <= pair[1].score));
        assert_eq!(hits[0].song.number, 1);
        assert_eq!(hits[1].song.number, 3);
    }

    #[test]
    fn closer_matches_rank_first_and_ties_keep_catalog_order() {
        let catalog = Catalog::new(vec![
            song(1, "Himmo viejo", &[]),
            song(2, "Himno nuevo", &[]),
            song(3, "Un himno", &[]),
        ]);
        let ranked: Vec<(i64, f64)> = search("himno", &catalog, &SearchOptions::default())
            .iter()
            .map(|hit| (hit.song.number, hit.score))
            .collect();
        assert_eq!(ranked, [(2, 0.0), (3, 0.0), (1, 0.2)]);
    }

    #[test]
    fn lyric_matches_carry_one_excerpt() {
        let catalog = catalog();
        let hits = search("contemplar", &catalog, &SearchOptions::default());
        assert_eq!(hits[0].song.number, 3);
        assert_eq!(
            hits[0].highlights,
            vec!["... Dios, al contemplar los cielo...".to_string()]
        );
    }

    #[test]
    fn excerpts_flatten_line_breaks() {
        let catalog = catalog();
        let hits = search("omnipotente", &catalog, &SearchOptions::default());
        assert_eq!(hits[0].song.number, 1);
        assert_eq!(hits[0].highlights, vec!["...Señor omnipotente, siempre ...".to_string()]);
    }

    #[test]
    fn title_only_matches_have_no_excerpt() {
        let catalog = catalog();
        let hits = search("himno de fe", &catalog, &SearchOptions::default());
        assert_eq!(hits[0].song.number, 2);
        assert!(hits[0].highlights.is_empty());
    }

    #[test]
    fn engine_memoizes_index_per_catalog() {
        let catalog = catalog();
        let mut engine = SearchEngine::default();

        let first = engine.search(&catalog, "castillo").to_vec();
        let second = engine.search(&catalog.clone(), " castillo ").to_vec();
        assert_eq!(first, second);
        engine.search(&catalog, "santo");
        assert_eq!(engine.index_builds(), 1);

        let reloaded = self::catalog();
        engine.search(&reloaded, "santo");
        assert_eq!(engine.index_builds(), 2);
    }
}
