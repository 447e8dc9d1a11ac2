//! Bit-parallel fuzzy subsequence matching.
//!
//! A candidate matches when the pattern bytes occur in it in order. Matches
//! are ranked by a memoized search over where each pattern suffix can be
//! aligned, rewarding long contiguous runs that start on word boundaries.

pub mod highlight;
pub(crate) mod text;
pub mod weight;

pub use highlight::{Highlights, Span};

use crate::pattern::Pattern;

/// Weight of a candidate that does not match
pub const MIN_WEIGHT: f32 = -1_000_000.0;

/// How word boundaries are rewarded
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", clap(rename_all = "snake_case"))]
pub enum MatchMode {
    /// Full path matching; a run right after `/` is rewarded the most
    #[default]
    FullPath,
    /// Any non-alphanumeric byte or case change is an equally good boundary
    NameOnly,
}

/// Trait for fuzzy matching a compiled pattern against choices
pub trait FuzzyMatcher: Send + Sync {
    /// Weight of `choice`, [`MIN_WEIGHT`] when it does not match
    fn fuzzy_weight(&self, choice: &[u8]) -> f32;

    /// Byte spans of the best alignment, `None` when `choice` does not match
    fn fuzzy_highlights(&self, choice: &[u8]) -> Option<Highlights>;

    /// fuzzy match choice with pattern, and return the weight of matching
    fn fuzzy_match(&self, choice: &[u8]) -> Option<f32> {
        let weight = self.fuzzy_weight(choice);
        (weight > MIN_WEIGHT).then_some(weight)
    }
}

/// Matcher running the bitmask algorithm for one compiled pattern
#[derive(Debug, Clone, Copy)]
pub struct BitMatcher<'p> {
    pattern: &'p Pattern,
    mode: MatchMode,
}

impl<'p> BitMatcher<'p> {
    /// Create a matcher scoring against `pattern` with `mode`
    pub fn new(pattern: &'p Pattern, mode: MatchMode) -> Self {
        Self { pattern, mode }
    }

    /// The pattern this matcher scores against
    pub fn pattern(&self) -> &'p Pattern {
        self.pattern
    }

    /// The boundary mode
    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

impl FuzzyMatcher for BitMatcher<'_> {
    fn fuzzy_weight(&self, choice: &[u8]) -> f32 {
        weight::weight(choice, self.pattern, self.mode)
    }

    fn fuzzy_highlights(&self, choice: &[u8]) -> Option<Highlights> {
        highlight::highlights(choice, self.pattern, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_match_filters_min_weight() {
        let pattern = Pattern::new("abc");
        let matcher = BitMatcher::new(&pattern, MatchMode::FullPath);
        assert!(matcher.fuzzy_match(b"a/b/c").is_some());
        assert!(matcher.fuzzy_match(b"acb").is_none());
    }

    #[test]
    fn highlights_and_weight_agree_on_matching() {
        let pattern = Pattern::new("fm");
        let matcher = BitMatcher::new(&pattern, MatchMode::NameOnly);
        for choice in [&b"fuzzyMatch"[..], b"format", b"mf", b""] {
            assert_eq!(
                matcher.fuzzy_match(choice).is_some(),
                matcher.fuzzy_highlights(choice).is_some(),
                "{}",
                String::from_utf8_lossy(choice)
            );
        }
    }
}
