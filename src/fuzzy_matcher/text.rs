//! Per-candidate scanning state.
//!
//! A [`TextContext`] records, for every distinct pattern byte, the text
//! positions that may stand in for it. The scorer and the highlighter walk
//! those positions with count-trailing-zero scans instead of byte loops.

use super::MatchMode;
use crate::pattern::{MAX_MASKED_LEN, Pattern};

/// Candidates are only scanned up to this many bytes
pub const MAX_TEXT_LEN: usize = (1 << 15) - 1;

/// Number of significant bits in `x`
#[inline(always)]
pub(crate) fn bit_length(x: u64) -> usize {
    (u64::BITS - x.leading_zeros()) as usize
}

#[inline(always)]
pub(crate) fn is_separator(b: u8) -> bool {
    b == b'/' || (cfg!(windows) && b == b'\\')
}

/// Case rule for locating the first and last pattern bytes: an uppercase
/// pattern byte only matches itself, any other byte matches case-insensitively.
#[inline(always)]
pub(crate) fn byte_matches(text: u8, pattern: u8) -> bool {
    if pattern.is_ascii_uppercase() {
        text == pattern
    } else {
        text.to_ascii_lowercase() == pattern
    }
}

/// Bonus for a run starting at `i`: text start, path separator, case change or punctuation.
pub(crate) fn boundary_bonus(text: &[u8], i: usize, k: usize, mode: MatchMode) -> u16 {
    if i == 0 {
        return match mode {
            MatchMode::FullPath => 5,
            MatchMode::NameOnly => 3,
        };
    }
    let prev = text[i - 1];
    if mode == MatchMode::FullPath && is_separator(prev) {
        return if k == 0 { 5 } else { 3 };
    }
    if text[i].is_ascii_uppercase() {
        let next_is_lower = text.get(i + 1).is_some_and(u8::is_ascii_lowercase);
        if !prev.is_ascii_uppercase() || next_is_lower { 3 } else { 0 }
    } else if !prev.is_ascii_alphanumeric() {
        3
    } else {
        0
    }
}

/// Mask that continues a run through `text[i]`, `None` when the byte breaks it.
///
/// A byte that is not in the pattern may still continue a run through its
/// lowercase form. In name-only mode this is restricted to uppercase
/// stretches, so `Cd` in `xxABCd` starts a new word instead.
#[inline]
pub(crate) fn run_mask(pattern: &Pattern, text: &[u8], i: usize, mode: MatchMode) -> Option<i64> {
    let c = text[i];
    if pattern.contains(c) {
        return Some(pattern.mask(c));
    }
    let lower = c.to_ascii_lowercase();
    if !pattern.contains(lower) {
        return None;
    }
    match mode {
        MatchMode::FullPath => Some(pattern.mask(lower)),
        MatchMode::NameOnly => {
            let in_caps = text[i - 1].is_ascii_uppercase()
                && text.get(i + 1).is_none_or(|n| !n.is_ascii_lowercase());
            in_caps.then(|| pattern.mask(lower))
        }
    }
}

/// Occurrence matrix of one candidate text
pub(crate) struct TextContext<'a> {
    text: &'a [u8],
    pattern: &'a Pattern,
    // one row per distinct pattern byte, `cols` words each; bit i is set when
    // text[i] may stand in for the row's byte
    masks: Vec<u64>,
    cols: usize,
    /// Lower bound for the next run search, advanced by the recursion
    pub offset: usize,
}

impl<'a> TextContext<'a> {
    /// Scans `text` for `pattern` (at least two masked bytes).
    ///
    /// Returns `None` when the pattern is not a subsequence of the text under
    /// the case rules, so the recursion only ever runs on matching text.
    pub fn build(text: &'a [u8], pattern: &'a Pattern) -> Option<Self> {
        let text = &text[..text.len().min(MAX_TEXT_LEN)];
        let masked = pattern.masked();
        debug_assert!(masked.len() >= 2);
        let (&first_byte, &last_byte) = (masked.first()?, masked.last()?);

        let first = text.iter().position(|&c| byte_matches(c, first_byte))?;
        let last = first + text[first..].iter().rposition(|&c| byte_matches(c, last_byte))?;

        let cols = text.len().div_ceil(64);
        let mut masks = vec![0u64; pattern.row_count() * cols];
        let mut set = |byte: u8, i: usize| {
            if let Some(row) = pattern.row(byte) {
                masks[row * cols + (i >> 6)] |= 1 << (i & 63);
            }
        };

        let mut j = 0;
        if pattern.is_lower() {
            for (i, &c) in text.iter().enumerate().take(last + 1).skip(first) {
                let c = c.to_ascii_lowercase();
                if pattern.contains(c) {
                    set(c, i);
                    if j < masked.len() && c == masked[j] {
                        j += 1;
                    }
                }
            }
        } else {
            for (i, &c) in text.iter().enumerate().take(last + 1).skip(first) {
                if c.is_ascii_uppercase() {
                    set(c, i);
                    set(c.to_ascii_lowercase(), i);
                    if j < masked.len() && c == masked[j].to_ascii_uppercase() {
                        j += 1;
                    }
                } else if pattern.contains(c) {
                    set(c, i);
                    if j < masked.len() && c == masked[j] {
                        j += 1;
                    }
                }
            }
        }

        if j < masked.len() {
            return None;
        }

        // bytes past the masked prefix have no bitmask, check them literally
        if pattern.actual_len() > MAX_MASKED_LEN && !is_subsequence(pattern.as_bytes(), &text[first..]) {
            return None;
        }

        Some(Self {
            text,
            pattern,
            masks,
            cols,
            offset: 0,
        })
    }

    /// The scanned (clamped) text
    #[inline(always)]
    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    /// First position at or after `from` that may stand in for `byte`
    pub fn next_occurrence(&self, byte: u8, from: usize) -> Option<usize> {
        let start = self.pattern.row(byte)? * self.cols;
        let row = &self.masks[start..start + self.cols];
        let col = from >> 6;
        if col >= self.cols {
            return None;
        }
        let x = row[col] >> (from & 63);
        if x != 0 {
            return Some(from + x.trailing_zeros() as usize);
        }
        row[col + 1..]
            .iter()
            .position(|&bits| bits != 0)
            .map(|c| {
                let col = col + 1 + c;
                (col << 6) + row[col].trailing_zeros() as usize
            })
    }
}

/// Exact, case-sensitive subsequence test
fn is_subsequence(needle: &[u8], haystack: &[u8]) -> bool {
    let mut rest = needle.iter().peekable();
    for c in haystack {
        match rest.peek() {
            Some(&&p) if p == *c => {
                rest.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    rest.peek().is_none()
}
