//! Reconstruction of the matched byte ranges.
//!
//! Follows the same search as [`weight`](super::weight) but carries the span
//! list of the best alignment along with its score.

use std::fmt;

use super::text::{MAX_TEXT_LEN, TextContext, bit_length, boundary_bonus, run_mask};
use super::weight::{gap_penalty, is_final, run_score, worth_recursing};
use super::{MIN_WEIGHT, MatchMode};
use crate::pattern::Pattern;

const MAX_SPANS: usize = 64;

/// A highlighted stretch of a candidate
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// 1-based byte column of the first highlighted byte
    pub col: u16,
    /// Number of highlighted bytes
    pub len: u16,
}

impl Span {
    /// Byte range of the span in the candidate
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.col as usize - 1;
        start..start + self.len as usize
    }
}

/// Spans of one match, in increasing column order
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Highlights {
    spans: [Span; MAX_SPANS],
    count: u8,
}

impl Default for Highlights {
    fn default() -> Self {
        Self {
            spans: [Span::default(); MAX_SPANS],
            count: 0,
        }
    }
}

impl Highlights {
    fn single(span: Span) -> Self {
        let mut highlights = Self::default();
        highlights.spans[0] = span;
        highlights.count = 1;
        highlights
    }

    // a pattern of at most 63 bytes never produces more than 63 spans
    fn prepended(&self, span: Span) -> Self {
        let count = self.len();
        let mut highlights = Self::default();
        highlights.spans[0] = span;
        highlights.spans[1..=count].copy_from_slice(self.as_slice());
        highlights.count = (count + 1) as u8;
        highlights
    }

    /// The spans
    pub fn as_slice(&self) -> &[Span] {
        &self.spans[..self.count as usize]
    }

    /// Number of spans
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether there are no spans, which only happens for the empty pattern
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate over the spans
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.as_slice().iter()
    }

    /// `(col, len)` pairs, the form a UI layer consumes
    pub fn to_pairs(&self) -> Vec<(u16, u16)> {
        self.iter().map(|s| (s.col, s.len)).collect()
    }
}

impl<'a> IntoIterator for &'a Highlights {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Highlights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|s| [s.col, s.len])).finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Group {
    score: f32,
    beg: usize,
    end: usize,
    spans: Highlights,
}

fn span(beg: usize, len: usize) -> Span {
    Span {
        col: (beg + 1) as u16,
        len: len as u16,
    }
}

fn evaluate_highlights(
    ctx: &mut TextContext<'_>,
    pattern: &Pattern,
    k: usize,
    groups: &mut [Option<Group>],
    mode: MatchMode,
) -> Option<Group> {
    let j = ctx.offset;
    if let Some(group) = groups[k]
        && group.beg >= j
    {
        return Some(group);
    }

    let masked = pattern.masked();
    let mut i = ctx.next_occurrence(masked[k], j)?;

    let text = ctx.text();
    let remaining = masked.len() - k;
    groups[k] = Some(Group::default());
    let mut best_score = MIN_WEIGHT;
    let mut best_prefix = 0;

    let mut special = boundary_bonus(text, i, k, mode);
    i += 1;
    let mut d: i64 = -2;
    let mut last;
    while i < text.len() {
        last = d;
        d = match run_mask(pattern, text, i, mode) {
            Some(mask) => (d << 1) | (mask >> k),
            None => -1,
        };

        if d >= last {
            let n = bit_length(!last as u64);
            let mut score = MIN_WEIGHT;
            let mut candidate = None;
            if n == remaining {
                score = run_score(n, special) as f32;
                let group = Group {
                    score,
                    beg: i - n,
                    end: i,
                    spans: Highlights::single(span(i - n, n)),
                };
                if is_final(mode, k, special) {
                    groups[k] = Some(group);
                    return Some(group);
                }
                candidate = Some(group);
            } else {
                let prefix_score = run_score(n, special);
                if worth_recursing(mode, prefix_score, best_prefix, special) {
                    best_prefix = prefix_score;
                    ctx.offset = i;
                    if let Some(rest) = evaluate_highlights(ctx, pattern, k + n, groups, mode)
                        && rest.end != 0
                    {
                        score = prefix_score as f32 + rest.score - gap_penalty(mode) * (rest.beg - i) as f32;
                        candidate = Some(Group {
                            score,
                            beg: i - n,
                            end: rest.end,
                            spans: rest.spans.prepended(span(i - n, n)),
                        });
                    }
                }
            }
            if score > best_score {
                best_score = score;
                groups[k] = candidate;
            }
            special = 0;
        }

        if d == -1 || d == last {
            match ctx.next_occurrence(masked[k], i) {
                Some(next) => i = next,
                None => break,
            }
            special = boundary_bonus(text, i, k, mode);
            d = -2;
        }
        i += 1;
    }

    if i == text.len() && (!d >> (remaining - 1)) != 0 {
        let score = run_score(remaining, special) as f32;
        if score > best_score {
            groups[k] = Some(Group {
                score,
                beg: i - remaining,
                end: i,
                spans: Highlights::single(span(i - remaining, remaining)),
            });
        }
    }

    groups[k]
}

/// Position highlighted for a single-byte pattern: the first word start, else
/// the first occurrence.
fn single_byte_position(text: &[u8], byte: u8) -> Option<usize> {
    if byte.is_ascii_uppercase() {
        return memchr::memchr(byte, text);
    }
    let mut first = None;
    for (i, &c) in text.iter().enumerate() {
        if c.to_ascii_lowercase() == byte {
            first.get_or_insert(i);
            if c.is_ascii_uppercase() || i == 0 || !text[i - 1].is_ascii_alphanumeric() {
                return Some(i);
            }
        }
    }
    first
}

/// Spans of the best alignment of `pattern` in `text`, `None` when it does not match.
pub fn highlights(text: &[u8], pattern: &Pattern, mode: MatchMode) -> Option<Highlights> {
    let text = &text[..text.len().min(MAX_TEXT_LEN)];
    match pattern.len() {
        0 => return Some(Highlights::default()),
        1 => {
            return single_byte_position(text, pattern.masked()[0]).map(|pos| Highlights::single(span(pos, 1)));
        }
        _ => {}
    }

    let mut ctx = TextContext::build(text, pattern)?;
    let mut groups = vec![None; pattern.len()];
    let best = evaluate_highlights(&mut ctx, pattern, 0, &mut groups, mode)?;
    (best.end != 0).then_some(best.spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hl(text: &str, pattern: &str) -> Option<Vec<(u16, u16)>> {
        highlights(text.as_bytes(), &Pattern::new(pattern), MatchMode::FullPath).map(|h| h.to_pairs())
    }

    fn hl_name(text: &str, pattern: &str) -> Option<Vec<(u16, u16)>> {
        highlights(text.as_bytes(), &Pattern::new(pattern), MatchMode::NameOnly).map(|h| h.to_pairs())
    }

    #[test]
    fn contiguous_word_start_wins() {
        assert_eq!(hl("a/abc", "abc"), Some(vec![(3, 3)]));
        assert_eq!(hl("lib/matcher.rs", "mat"), Some(vec![(5, 3)]));
    }

    #[test]
    fn scattered_bytes() {
        assert_eq!(hl("xaybzc", "abc"), Some(vec![(2, 1), (4, 1), (6, 1)]));
        assert_eq!(hl("src/foo_bar.rs", "fb"), Some(vec![(5, 1), (9, 1)]));
    }

    #[test]
    fn camel_case_in_name_only() {
        assert_eq!(hl_name("FooBar", "fb"), Some(vec![(1, 1), (4, 1)]));
    }

    #[test]
    fn single_byte_prefers_word_start() {
        assert_eq!(hl("xxx_a", "a"), Some(vec![(5, 1)]));
        assert_eq!(hl("xaxa", "a"), Some(vec![(2, 1)]));
        assert_eq!(hl("xaxA", "A"), Some(vec![(4, 1)]));
    }

    #[test]
    fn empty_and_missing() {
        assert_eq!(hl("abc", ""), Some(vec![]));
        assert_eq!(hl("acb", "abc"), None);
        assert_eq!(hl("", "a"), None);
    }

    #[test]
    fn span_ranges() {
        let h = highlights(b"a/abc", &Pattern::new("abc"), MatchMode::FullPath).unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.as_slice()[0].range(), 2..5);
        assert_eq!(format!("{h:?}"), "[[3, 3]]");
    }
}
