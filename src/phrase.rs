//! Shared-phrase detection between two node texts.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub const DEFAULT_MIN_WORDS: usize = 5;
pub const MAX_PHRASE_WORDS: usize = 20;

#[derive(Debug, Error)]
pub enum PhraseError {
    #[error("minimum phrase length must be between 1 and {MAX_PHRASE_WORDS} words, got {0}")]
    InvalidMinimum(usize),
    #[error("failed to compile phrase pattern")]
    Pattern(#[from] regex::Error),
}

/// Finds runs of `min_words..=MAX_PHRASE_WORDS` words that appear in both texts.
#[derive(Clone, Debug)]
pub struct PhraseMatcher {
    pattern: Regex,
}

impl PhraseMatcher {
    pub fn new(min_words: usize) -> Result<Self, PhraseError> {
        if !(1..=MAX_PHRASE_WORDS).contains(&min_words) {
            return Err(PhraseError::InvalidMinimum(min_words));
        }

        let pattern = Regex::new(&format!(
            r"\b(\w+(?:\s+\w+){{{},{}}})\b",
            min_words - 1,
            MAX_PHRASE_WORDS - 1
        ))?;
        Ok(Self { pattern })
    }

    /// Lowercased phrases from `text` that `other` also contains, longest first.
    ///
    /// Matches are greedy and do not overlap, so a run longer than the shared
    /// part is tested as a whole.
    pub fn shared_phrases(&self, text: &str, other: &str) -> Vec<String> {
        let other = other.to_lowercase();
        let mut phrases: Vec<String> = Vec::new();

        for found in self.pattern.find_iter(text) {
            let phrase = found.as_str().to_lowercase();
            if other.contains(&phrase) && !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }

        phrases.sort_by(|a, b| b.len().cmp(&a.len()));
        phrases
    }
}

pub fn find_shared_phrases(
    text: &str,
    other: &str,
    min_words: usize,
) -> Result<Vec<String>, PhraseError> {
    Ok(PhraseMatcher::new(min_words)?.shared_phrases(text, other))
}

/// Byte ranges of `text` covered by any of `phrases`, case-insensitive,
/// sorted and merged.
pub fn highlight_ranges(text: &str, phrases: &[String]) -> Result<Vec<Range<usize>>, PhraseError> {
    let mut ranges = Vec::new();
    for phrase in phrases.iter().filter(|phrase| !phrase.is_empty()) {
        let pattern = RegexBuilder::new(&regex::escape(phrase))
            .case_insensitive(true)
            .build()?;
        ranges.extend(pattern.find_iter(text).map(|found| found.range()));
    }

    ranges.sort_by_key(|range| range.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = merged.last_mut()
            && range.start <= last.end
        {
            last.end = last.end.max(range.end);
            continue;
        }
        merged.push(range);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_case_insensitive_shared_run() {
        let phrases = find_shared_phrases(
            "alpha beta gamma delta epsilon",
            "we said Alpha Beta Gamma Delta Epsilon loudly",
            DEFAULT_MIN_WORDS,
        )
        .expect("valid minimum");

        assert_eq!(phrases, vec!["alpha beta gamma delta epsilon".to_owned()]);
    }

    #[test]
    fn greedy_run_must_be_shared_whole() {
        let phrases = find_shared_phrases(
            "the quick brown fox jumps over the lazy dog",
            "the quick brown fox jumps over fences",
            DEFAULT_MIN_WORDS,
        )
        .expect("valid minimum");

        assert!(phrases.is_empty());
    }

    #[test]
    fn orders_longest_first_and_deduplicates() {
        let matcher = PhraseMatcher::new(2).expect("valid minimum");
        let phrases = matcher.shared_phrases(
            "red green. blue yellow. red green.",
            "blue yellow and red green too",
        );

        assert_eq!(phrases, vec!["blue yellow".to_owned(), "red green".to_owned()]);
    }

    #[test]
    fn rejects_out_of_range_minimum() {
        assert!(matches!(PhraseMatcher::new(0), Err(PhraseError::InvalidMinimum(0))));
        assert!(matches!(PhraseMatcher::new(21), Err(PhraseError::InvalidMinimum(21))));
        assert!(PhraseMatcher::new(1).is_ok());
        assert!(PhraseMatcher::new(MAX_PHRASE_WORDS).is_ok());
    }

    #[test]
    fn highlight_ranges_merge_overlaps() {
        let text = "Red Green blue, red green";
        let phrases = vec!["red green".to_owned(), "green blue".to_owned()];

        let ranges = highlight_ranges(text, &phrases).expect("escaped phrases compile");

        assert_eq!(ranges, vec![0..14, 16..25]);
        assert_eq!(&text[16..25], "red green");
    }

    #[test]
    fn highlight_ranges_escape_metacharacters() {
        let ranges = highlight_ranges("cost (a+b) today", &["(a+b)".to_owned()])
            .expect("escaped phrases compile");

        assert_eq!(ranges, vec![5..10]);
    }
}
