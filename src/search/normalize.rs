//! Accent and case folding for search text.
//!
//! Folding works char by char so index `i` of the folded text always refers to
//! char `i` of the original; highlight spans found on folded text can be cut
//! straight out of the original lyrics.

use nucleo_matcher::chars;

/// Strip diacritics and lowercase a single char.
pub fn fold_char(c: char) -> char {
    chars::to_lower_case(chars::normalize(c))
}

/// Fold a whole string into a char vector ready for matching.
pub fn fold(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_and_case_fold_together() {
        assert_eq!(fold("Hímno"), fold("himno"));
        assert_eq!(fold("ÁNGELES"), "angeles".chars().collect::<Vec<_>>());
    }

    #[test]
    fn folding_preserves_char_count() {
        let text = "Señor, tú has sido\nnuestro refugio";
        assert_eq!(fold(text).len(), text.chars().count());
    }
}
