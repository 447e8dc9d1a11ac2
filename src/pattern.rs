//! Pattern compilation.
//!
//! A [`Pattern`] is built once per query and shared read-only by every
//! thread that scores candidates against it. It holds the occurrence
//! bitmasks the scanner and the scorer shift through.

/// Width of the bitmask word, minus the sign bit kept as a run sentinel.
pub const MAX_MASKED_LEN: usize = 63;

/// Mask value of a byte that does not occur in the pattern.
pub(crate) const ABSENT: i64 = -1;

const NO_ROW: u8 = u8::MAX;

/// A compiled query.
///
/// `mask(b)` starts as all ones and has bit `i` cleared for every position
/// `i` (below [`MAX_MASKED_LEN`]) where the pattern holds byte `b`. Shifting
/// a run state through these masks is how a scan decides whether the next
/// text byte continues the current run.
#[derive(Clone)]
pub struct Pattern {
    bytes: Box<[u8]>,
    masks: [i64; 256],
    // row of each distinct masked byte in a text occurrence matrix
    rows: [u8; 256],
    row_count: usize,
    len: usize,
    is_lower: bool,
}

impl Pattern {
    /// Compiles `pattern`. Any byte string is a valid pattern.
    pub fn new(pattern: impl AsRef<[u8]>) -> Self {
        let bytes: Box<[u8]> = pattern.as_ref().into();
        let len = bytes.len().min(MAX_MASKED_LEN);
        let mut masks = [ABSENT; 256];

        for (i, &b) in bytes[..len].iter().enumerate() {
            masks[b as usize] ^= 1 << i;
            // an uppercase byte that is itself in the pattern would never reach the
            // case-folding fallback, so it has to carry the lowercase positions too
            if b.is_ascii_lowercase() {
                let upper = b.to_ascii_uppercase() as usize;
                if masks[upper] != ABSENT {
                    masks[upper] ^= 1 << i;
                }
            }
        }

        let mut rows = [NO_ROW; 256];
        let mut row_count = 0;
        for &b in &bytes[..len] {
            if rows[b as usize] == NO_ROW {
                rows[b as usize] = row_count as u8;
                row_count += 1;
            }
        }

        let is_lower = !bytes[..len].iter().any(u8::is_ascii_uppercase);
        trace!("compiled pattern of {} bytes (masked {len}, lower: {is_lower})", bytes.len());

        Self {
            bytes,
            masks,
            rows,
            row_count,
            len,
            is_lower,
        }
    }

    /// The raw pattern bytes, including anything past the masked prefix
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes covered by the bitmasks (at most [`MAX_MASKED_LEN`])
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pattern is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the pattern as given
    pub fn actual_len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the masked part of the pattern has no uppercase byte, in
    /// which case matching is fully case-insensitive.
    pub fn is_lower(&self) -> bool {
        self.is_lower
    }

    /// Occurrence mask of `byte`
    #[inline(always)]
    pub fn mask(&self, byte: u8) -> i64 {
        self.masks[byte as usize]
    }

    /// Whether `byte` occurs in the masked part of the pattern
    #[inline(always)]
    pub fn contains(&self, byte: u8) -> bool {
        self.masks[byte as usize] != ABSENT
    }

    /// Row of `byte` in a text occurrence matrix, for bytes of the masked prefix
    #[inline(always)]
    pub(crate) fn row(&self, byte: u8) -> Option<usize> {
        let row = self.rows[byte as usize];
        (row != NO_ROW).then_some(row as usize)
    }

    /// Number of distinct bytes in the masked prefix
    pub(crate) fn row_count(&self) -> usize {
        self.row_count
    }

    /// The masked pattern prefix
    #[inline(always)]
    pub(crate) fn masked(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("pattern", &String::from_utf8_lossy(&self.bytes))
            .field("len", &self.len)
            .field("is_lower", &self.is_lower)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_clear_one_bit_per_occurrence() {
        let p = Pattern::new("abca");
        assert_eq!(p.mask(b'a'), !0b1001);
        assert_eq!(p.mask(b'b'), !0b0010);
        assert_eq!(p.mask(b'c'), !0b0100);
        assert_eq!(p.mask(b'z'), ABSENT);
        assert!(p.is_lower());
    }

    #[test]
    fn lowercase_mirrors_onto_present_uppercase() {
        let p = Pattern::new("Aa");
        assert_eq!(p.mask(b'A'), !0b11);
        assert_eq!(p.mask(b'a'), !0b10);
        assert!(!p.is_lower());
    }

    #[test]
    fn lowercase_does_not_create_uppercase_entry() {
        let p = Pattern::new("aB");
        assert_eq!(p.mask(b'A'), ABSENT);
        assert!(p.contains(b'B'));
        assert!(!p.contains(b'b'));
    }

    #[test]
    fn rows_are_assigned_per_distinct_byte() {
        let p = Pattern::new("abab");
        assert_eq!(p.row_count(), 2);
        assert_eq!(p.row(b'a'), Some(0));
        assert_eq!(p.row(b'b'), Some(1));
        assert_eq!(p.row(b'c'), None);
    }

    #[test]
    fn long_patterns_are_clamped() {
        let raw = "x".repeat(80);
        let p = Pattern::new(&raw);
        assert_eq!(p.len(), MAX_MASKED_LEN);
        assert_eq!(p.actual_len(), 80);
        // bit 63 is never cleared, so the mask stays negative
        assert!(p.mask(b'x') < 0);
    }

    #[test]
    fn empty_pattern() {
        let p = Pattern::new("");
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
        assert!(p.is_lower());
    }
}
