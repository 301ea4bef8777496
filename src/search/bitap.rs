//! Approximate substring matching (bitap / shift-and with up to `k` errors).
//!
//! A pattern of `m` chars matches a text with `e` errors (insertions,
//! deletions or substitutions) when `e / m` stays within the caller's
//! threshold. Where in the text the match sits does not matter.

use std::collections::HashMap;

/// Widest pattern a single bit-parallel pass can track.
pub const MAX_CHUNK_CHARS: usize = 64;

/// Inclusive `(start, end)` char positions of a matched run.
pub type Span = (usize, usize);

/// Best match of one chunk against one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMatch {
    pub errors: usize,
    pub spans: Vec<Span>,
}

/// Result of matching a whole (possibly multi-chunk) pattern against a text.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    /// Normalized distance in `[0, 1]`; 0 is an exact match.
    pub score: f64,
    pub spans: Vec<Span>,
}

impl FieldMatch {
    /// The longest matched run; the first one wins ties.
    pub fn longest_span(&self) -> Option<Span> {
        self.spans.iter().copied().fold(None, |best, span| match best {
            Some(current) if span_len(current) >= span_len(span) => Some(current),
            _ => Some(span),
        })
    }
}

pub fn span_len((start, end): Span) -> usize {
    end + 1 - start
}

/// Up to 64 pattern chars with their bit masks.
#[derive(Debug, Clone)]
struct Chunk {
    len: usize,
    masks: HashMap<char, u64>,
}

impl Chunk {
    fn new(chars: &[char]) -> Self {
        let mut masks: HashMap<char, u64> = HashMap::new();
        for (idx, &c) in chars.iter().enumerate() {
            *masks.entry(c).or_default() |= 1 << idx;
        }
        Self {
            len: chars.len(),
            masks,
        }
    }

    /// Errors tolerated for this chunk under `threshold`. Never the whole
    /// chunk, otherwise any text would match.
    fn max_errors(&self, threshold: f64) -> usize {
        let allowed = (threshold.clamp(0.0, 1.0) * self.len as f64 + 1e-9).floor() as usize;
        allowed.min(self.len - 1)
    }

    fn find(&self, text: &[char], max_errors: usize) -> Option<ChunkMatch> {
        let last = 1u64 << (self.len - 1);
        // state[d] bit i: pattern[..=i] ends at the current char with <= d errors.
        let mut state: Vec<u64> = (0..=max_errors).map(|d| (1u64 << d) - 1).collect();
        let mut best: Option<usize> = None;
        let mut ends = Vec::new();

        for (pos, c) in text.iter().enumerate() {
            let mask = self.masks.get(c).copied().unwrap_or(0);
            let mut prev_old = state[0];
            state[0] = ((state[0] << 1) | 1) & mask;
            for d in 1..=max_errors {
                let old = state[d];
                state[d] = (((old << 1) | 1) & mask)
                    | prev_old
                    | ((prev_old | state[d - 1]) << 1)
                    | 1;
                prev_old = old;
            }

            let Some(errors) = (0..=max_errors).find(|&d| state[d] & last != 0) else {
                continue;
            };
            match best {
                Some(current) if errors > current => {}
                Some(current) if errors == current => ends.push(pos),
                _ => {
                    best = Some(errors);
                    ends.clear();
                    ends.push(pos);
                }
            }
        }

        let errors = best?;
        Some(ChunkMatch {
            errors,
            spans: self.spans(text, &ends, errors),
        })
    }

    /// Runs of pattern chars inside the windows that produced a best match.
    fn spans(&self, text: &[char], ends: &[usize], errors: usize) -> Vec<Span> {
        let mut marked = vec![false; text.len()];
        for &end in ends {
            let start = (end + 1).saturating_sub(self.len + errors);
            for pos in start..=end {
                if self.masks.contains_key(&text[pos]) {
                    marked[pos] = true;
                }
            }
        }

        let mut spans = Vec::new();
        let mut run_start: Option<usize> = None;
        for (pos, &hit) in marked.iter().enumerate() {
            match (hit, run_start) {
                (true, None) => run_start = Some(pos),
                (false, Some(start)) => {
                    spans.push((start, pos - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            spans.push((start, marked.len() - 1));
        }
        spans
    }
}

/// A folded query split into bit-parallel chunks.
#[derive(Debug, Clone)]
pub struct Pattern {
    chunks: Vec<Chunk>,
}

impl Pattern {
    /// Returns `None` for an empty pattern.
    pub fn new(chars: &[char]) -> Option<Self> {
        if chars.is_empty() {
            return None;
        }
        let chunks = chars.chunks(MAX_CHUNK_CHARS).map(Chunk::new).collect();
        Some(Self { chunks })
    }

    /// Match against a folded text. A multi-chunk pattern matches when any
    /// chunk does; its score averages every chunk, misses counting as 1.
    pub fn match_text(&self, text: &[char], threshold: f64) -> Option<FieldMatch> {
        let mut total = 0.0;
        let mut matched = false;
        let mut spans = Vec::new();

        for chunk in &self.chunks {
            match chunk.find(text, chunk.max_errors(threshold)) {
                Some(found) => {
                    matched = true;
                    total += found.errors as f64 / chunk.len as f64;
                    spans.extend(found.spans);
                }
                None => total += 1.0,
            }
        }

        if !matched {
            return None;
        }
        spans.sort_unstable();
        spans.dedup();
        Some(FieldMatch {
            score: total / self.chunks.len() as f64,
            spans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn matches(pattern: &str, text: &str, threshold: f64) -> Option<FieldMatch> {
        Pattern::new(&chars(pattern))?.match_text(&chars(text), threshold)
    }

    #[test]
    fn exact_substring_scores_zero() {
        let found = matches("gracia", "sublime gracia del señor", 0.3).unwrap();
        assert_eq!(found.score, 0.0);
        assert_eq!(found.longest_span(), Some((8, 13)));
    }

    #[test]
    fn tolerates_one_typo_in_five_chars() {
        let found = matches("himno", "un himmo de alabanza", 0.3).unwrap();
        assert!((found.score - 0.2).abs() < 1e-9);

        assert!(matches("himno", "un hxmxo de alabanza", 0.3).is_none());
    }

    #[test]
    fn zero_threshold_demands_exact_matches() {
        assert!(matches("himno", "un himmo", 0.0).is_none());
        assert!(matches("himno", "un himno", 0.0).is_some());
    }

    #[test]
    fn short_patterns_get_no_error_budget() {
        assert!(matches("fe", "fa", 0.3).is_none());
        assert!(matches("fe", "la fe", 0.3).is_some());
    }

    #[test]
    fn deletions_and_insertions_count_as_errors() {
        // "alelya" is "aleluya" minus one char; "aleeluya" has one extra.
        let short = matches("aleluya", "alelya", 0.3).unwrap();
        assert!((short.score - 1.0 / 7.0).abs() < 1e-9);
        let long = matches("aleluya", "aleeluya", 0.3).unwrap();
        assert!((long.score - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn location_does_not_change_the_score() {
        let early = matches("cordero", "cordero de dios", 0.3).unwrap();
        let late = matches(
            "cordero",
            &format!("{}cordero de dios", "la la la ".repeat(40)),
            0.3,
        )
        .unwrap();
        assert_eq!(early.score, late.score);
    }

    #[test]
    fn long_patterns_are_chunked() {
        let pattern = "a".repeat(70);
        let text = "a".repeat(80);
        let found = matches(&pattern, &text, 0.3).unwrap();
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(Pattern::new(&[]).is_none());
    }
}
