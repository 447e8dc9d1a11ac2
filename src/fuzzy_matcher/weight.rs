//! Weight of a candidate.
//!
//! The search tries, for pattern suffix `k`, every place in the text where a
//! run of it may start, recursing into the rest of the pattern after each
//! run. Results per suffix are memoized: a later call for the same suffix
//! with a lower bound that the stored best start still satisfies reuses it.

use super::text::{TextContext, bit_length, boundary_bonus, run_mask};
use super::{MIN_WEIGHT, MatchMode};
use crate::pattern::Pattern;

/// Score of a run of `n` bytes without a boundary bonus, indexed by `n`.
///
/// Runs one byte longer than a bonus-carrying run of the whole masked
/// pattern read the last entry.
pub const VALUE_TABLE: [u16; 65] = [
    0, 1, 4, 7, 13, 19, 25, 31, //
    37, 43, 49, 55, 61, 67, 73, 79, //
    85, 91, 97, 103, 109, 115, 121, 127, //
    133, 139, 145, 151, 157, 163, 169, 175, //
    181, 187, 193, 199, 205, 211, 217, 223, //
    229, 235, 241, 247, 253, 259, 265, 271, //
    277, 283, 289, 295, 301, 307, 313, 319, //
    325, 331, 337, 343, 349, 355, 361, 367, //
    373,
];

/// Score of a run of `n` bytes starting with boundary bonus `special`
#[inline(always)]
pub(crate) fn run_score(n: usize, special: u16) -> u16 {
    if special > 0 {
        let base = if n > 1 { VALUE_TABLE[n + 1] } else { VALUE_TABLE[n] };
        base + special
    } else {
        VALUE_TABLE[n]
    }
}

/// Penalty per byte of gap between consecutive runs
#[inline(always)]
pub(crate) fn gap_penalty(mode: MatchMode) -> f32 {
    match mode {
        MatchMode::FullPath => 0.3,
        MatchMode::NameOnly => 0.2,
    }
}

/// A complete run with this bonus cannot be beaten by a later start
#[inline(always)]
pub(crate) fn is_final(mode: MatchMode, k: usize, special: u16) -> bool {
    match mode {
        MatchMode::FullPath => (k == 0 && special == 5) || (k > 0 && special > 0),
        MatchMode::NameOnly => special > 0,
    }
}

/// Whether a run with `prefix_score` is worth recursing on
#[inline(always)]
pub(crate) fn worth_recursing(mode: MatchMode, prefix_score: u16, best_prefix: u16, special: u16) -> bool {
    // full paths prefer the later of two equally scored word starts, e.g.
    // `Abcyyde` over `Abcxx` in `AbcxxAbcyyde` for `abcde`
    prefix_score > best_prefix || (mode == MatchMode::FullPath && special > 0 && prefix_score == best_prefix)
}

/// Best alignment of one pattern suffix
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Value {
    pub score: f32,
    pub beg: usize,
    // zero when the suffix has no alignment
    pub end: usize,
}

/// Best alignment of `pattern[k..]` starting at or after `ctx.offset`.
pub(crate) fn evaluate(ctx: &mut TextContext<'_>, pattern: &Pattern, k: usize, memo: &mut [Value], mode: MatchMode) -> Value {
    let masked = pattern.masked();
    let j = ctx.offset;
    let Some(mut i) = ctx.next_occurrence(masked[k], j) else {
        return Value::default();
    };

    // e.g. text = '~abc~~AbcD~~', pattern = 'abcd'
    if j > 0 && memo[k].beg >= j {
        return memo[k];
    }

    let text = ctx.text();
    let remaining = masked.len() - k;
    let mut best = Value {
        score: MIN_WEIGHT,
        beg: 0,
        end: 0,
    };
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
            // the run ended just before `i`
            let n = bit_length(!last as u64);
            let mut score = MIN_WEIGHT;
            let mut end = 0;
            if n == remaining {
                score = run_score(n, special) as f32;
                if is_final(mode, k, special) {
                    memo[k] = Value { score, beg: i - n, end: i };
                    return memo[k];
                }
                end = i;
            } else {
                let prefix_score = run_score(n, special);
                if worth_recursing(mode, prefix_score, best_prefix, special) {
                    best_prefix = prefix_score;
                    ctx.offset = i;
                    let rest = evaluate(ctx, pattern, k + n, memo, mode);
                    if rest.end != 0 {
                        score = prefix_score as f32 + rest.score - gap_penalty(mode) * (rest.beg - i) as f32;
                        end = rest.end;
                    }
                }
            }
            if score > best.score {
                best = Value { score, beg: i - n, end };
            }
            // e.g. text = '~_ababc~~~~', pattern = 'abc'
            special = 0;
        }

        // `d == last` covers text = 'kpi_oos1', pattern = 'kos'
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

    // e.g. text = '~~~~abcd', pattern = 'abcd'
    if i == text.len() && (!d >> (remaining - 1)) != 0 {
        let score = run_score(remaining, special) as f32;
        if score > best.score {
            best = Value {
                score,
                beg: i - remaining,
                end: i,
            };
        }
    }

    memo[k] = best;
    best
}

/// Weight of a single-byte pattern; a word-start occurrence outranks any other.
fn single_byte_weight(text: &[u8], byte: u8) -> f32 {
    let len = text.len() as f32;
    if byte.is_ascii_uppercase() {
        return match memchr::memchr(byte, text) {
            Some(pos) => 1.0 / (pos + 1) as f32 + 1.0 / len,
            None => MIN_WEIGHT,
        };
    }

    let mut first = None;
    for (i, &c) in text.iter().enumerate() {
        if c.to_ascii_lowercase() == byte {
            first.get_or_insert(i);
            if c.is_ascii_uppercase() || i == 0 || !text[i - 1].is_ascii_alphanumeric() {
                return 2.0 + 1.0 / (i + 1) as f32 + 1.0 / len;
            }
        }
    }
    match first {
        Some(pos) => 1.0 / (pos + 1) as f32 + 1.0 / len,
        None => MIN_WEIGHT,
    }
}

/// Weight of `text` against `pattern`, [`MIN_WEIGHT`] when it does not match.
///
/// Candidates longer than [`MAX_TEXT_LEN`](super::text::MAX_TEXT_LEN) are
/// scored on their prefix.
pub fn weight(text: &[u8], pattern: &Pattern, mode: MatchMode) -> f32 {
    let text = &text[..text.len().min(super::text::MAX_TEXT_LEN)];
    match pattern.len() {
        0 => return 0.0,
        1 => return single_byte_weight(text, pattern.masked()[0]),
        _ => {}
    }

    let Some(mut ctx) = TextContext::build(text, pattern) else {
        return MIN_WEIGHT;
    };
    let mut memo = [Value::default(); 64];
    let best = evaluate(&mut ctx, pattern, 0, &mut memo, mode);
    if best.end == 0 {
        return MIN_WEIGHT;
    }

    let len = text.len() as f32;
    match mode {
        MatchMode::NameOnly => {
            let at_start = if best.beg == 0 { 1.0 } else { 0.0 };
            best.score + at_start + 1.0 / (best.beg + best.end) as f32 + 1.0 / len
        }
        MatchMode::FullPath => {
            let plen = pattern.len() as f32;
            best.score + plen / len + (2.0 * plen) / (text.len() - best.beg) as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str, pattern: &str) -> f32 {
        weight(text.as_bytes(), &Pattern::new(pattern), MatchMode::FullPath)
    }

    fn score_name(text: &str, pattern: &str) -> f32 {
        weight(text.as_bytes(), &Pattern::new(pattern), MatchMode::NameOnly)
    }

    #[test]
    fn run_scores() {
        assert_eq!(run_score(1, 0), 1);
        assert_eq!(run_score(1, 5), 6);
        assert_eq!(run_score(3, 0), 7);
        assert_eq!(run_score(3, 5), 18);
        assert_eq!(run_score(63, 3), 376);
    }

    #[test]
    fn non_matches() {
        assert_eq!(score("acb", "abc"), MIN_WEIGHT);
        assert_eq!(score("", "abc"), MIN_WEIGHT);
        assert_eq!(score("xyz", "a"), MIN_WEIGHT);
        assert_eq!(score("abc", "C"), MIN_WEIGHT);
        assert_eq!(score_name("ab", "aB"), MIN_WEIGHT);
    }

    #[test]
    fn empty_pattern_matches_everything() {
        assert_eq!(score("anything", ""), 0.0);
        assert_eq!(score("", ""), 0.0);
    }

    #[test]
    fn contiguous_run_at_start() {
        // run of 3 at the text start: 13 + 5, then 3/3 + 6/3
        assert_eq!(score("abc", "abc"), 18.0 + 1.0 + 2.0);
    }

    #[test]
    fn word_starts_beat_scattered_bytes() {
        assert!(score("a/abc", "abc") > score("xaybzc", "abc"));
        assert!(score("src/foo_bar.rs", "fb") > score("src/xfxxbx.rs", "fb"));
        assert!(score_name("FooBar", "fb") > score_name("xfoobar", "fb"));
    }

    #[test]
    fn separator_start_beats_camel_case_in_full_path() {
        assert!(score("lib/matcher.rs", "mat") > score("libMatcher.rs", "mat"));
    }

    #[test]
    fn single_byte() {
        // word start at index 4
        assert_eq!(score("xxx_a", "a"), 2.0 + 1.0 / 5.0 + 1.0 / 5.0);
        // no word start: first occurrence
        assert_eq!(score("xaxa", "a"), 1.0 / 2.0 + 1.0 / 4.0);
        assert_eq!(score("xxA", "A"), 1.0 / 3.0 + 1.0 / 3.0);
        assert!(score("Apple", "a") > score("pineapple", "a"));
    }

    #[test]
    fn name_only_prefers_early_tight_matches() {
        assert!(score_name("abc", "abc") > score_name("xabc", "abc"));
        assert!(score_name("ab_c", "abc") > score_name("ab__c", "abc"));
    }

    #[test]
    fn uppercase_stretch_continues_in_name_only() {
        assert!(score_name("xxABC", "abc") > score_name("xxABCd", "abc"));
    }

    #[test]
    fn long_text_is_truncated() {
        let mut text = "x".repeat(40_000);
        text.push_str("abc");
        assert_eq!(score(&text, "abc"), MIN_WEIGHT);
        let text = format!("abc{}", "x".repeat(40_000));
        assert!(score(&text, "abc") > MIN_WEIGHT);
    }

    #[test]
    fn runs_across_word_boundaries() {
        let text = format!("{}a/b/c", "x".repeat(100));
        assert!(score(&text, "abc") > MIN_WEIGHT);
        assert!(score(&text, "abc") > score(&format!("{}axbxc", "x".repeat(100)), "abc"));
    }
}
