//! Fuzzy search over the song catalog: accent folding, approximate matching
//! and the memoizing engine the UI talks to.

pub mod bitap;
mod engine;
pub mod normalize;

pub use engine::{
    search, SearchEngine, SearchHit, SearchIndex, SearchOptions, DEFAULT_CONTEXT_CHARS,
    DEFAULT_LIMIT, DEFAULT_THRESHOLD,
};
