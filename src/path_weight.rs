//! Rename guessing.
//!
//! Given the path of the file being edited, ranks candidate paths by how
//! likely they are its counterpart: `foo.h` for `foo.c`, a sibling with a
//! different extension, a file sharing a name prefix in the same directory.
//!
//! The weight packs its criteria into one `u32` so a plain descending sort
//! orders candidates by, in priority: shared filename prefix at a word
//! boundary, shared leading directories, same directory, shared filename
//! bytes, differing suffix, shorter path.

use crate::fuzzy_matcher::text::is_separator;

/// The file a rename is being guessed for
///
/// For `/usr/src/example.tar.gz`: `dirname` is `/usr/src`, `filename` is
/// `example.tar` and `suffix` is `.gz`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTarget {
    /// Basename without its last extension
    pub filename: Vec<u8>,
    /// Last extension including the dot, may be empty
    pub suffix: Vec<u8>,
    /// Directory part, without trailing separator
    pub dirname: Vec<u8>,
}

impl RenameTarget {
    /// Split `path` into dirname, filename and suffix
    pub fn from_path(path: impl AsRef<[u8]>) -> Self {
        let path = path.as_ref();
        let (dirname, basename) = match last_separator(path) {
            Some(pos) => (&path[..pos], &path[pos + 1..]),
            None => (&path[..0], path),
        };
        // a leading dot names a hidden file, not an extension
        let (filename, suffix) = match memchr::memrchr(b'.', basename) {
            Some(pos) if pos > 0 => basename.split_at(pos),
            _ => (basename, &basename[basename.len()..]),
        };
        Self {
            filename: filename.to_vec(),
            suffix: suffix.to_vec(),
            dirname: dirname.to_vec(),
        }
    }
}

fn last_separator(path: &[u8]) -> Option<usize> {
    if cfg!(windows) {
        memchr::memrchr2(b'/', b'\\', path)
    } else {
        memchr::memrchr(b'/', path)
    }
}

// bytes past the end read as a terminator
#[inline(always)]
fn at(s: &[u8], i: usize) -> u8 {
    s.get(i).copied().unwrap_or(0)
}

fn is_lower_or_digit(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

/// Walks back from `p` over bytes matching `pred` and returns the length of
/// the filename prefix before the partial word.
fn word_prefix(path: &[u8], filename_start: usize, mut p: usize, pred: fn(&u8) -> bool) -> u32 {
    p -= 1;
    while p > filename_start && pred(&path[p]) {
        p -= 1;
    }
    (p - filename_start) as u32
}

/// Relatedness of `path` to `target`; higher is closer, and `path` being the
/// target itself scores 0.
pub fn path_weight(target: &RenameTarget, path: &[u8]) -> u32 {
    let RenameTarget {
        filename,
        suffix,
        dirname,
    } = target;

    let filename_start = last_separator(path).map_or(0, |pos| pos + 1);
    let mut filename_lcp = 0u32;
    let mut filename_prefix = 0u32;
    let mut suffix_diff = 0u32;
    let mut basename_same = false;

    if !suffix.is_empty() {
        let (mut p, mut p1) = (filename_start, 0);
        while at(path, p) != 0 && at(path, p) == at(filename, p1) {
            filename_lcp += 1;
            p += 1;
            p1 += 1;
        }
        filename_prefix = filename_lcp;

        if filename_lcp > 0 {
            let (c, c1) = (at(path, p), at(filename, p1));
            // the common prefix stops inside a word: only count whole words
            if is_lower_or_digit(c) || is_lower_or_digit(c1) {
                filename_prefix = word_prefix(path, filename_start, p, u8::is_ascii_lowercase);
            } else if c.is_ascii_uppercase() && c1.is_ascii_uppercase() && path[p - 1].is_ascii_uppercase() {
                filename_prefix = word_prefix(path, filename_start, p, u8::is_ascii_uppercase);
            }
        }

        let tail = path.get(filename_start + 1..).unwrap_or_default();
        if let Some(dot) = memchr::memrchr(b'.', tail).map(|pos| filename_start + 1 + pos) {
            if path[dot..] != suffix[..] {
                suffix_diff = u32::from(filename_lcp > 0);
            } else if at(filename, p1) == 0 && filename_lcp as usize == dot - filename_start {
                basename_same = true;
            }
        }
    } else {
        basename_same = filename[..] == path[filename_start..];
    }

    let (mut p, mut p1) = (0, 0);
    let mut dirname_lcp = 0u32;
    while p < filename_start {
        let (c, c1) = (path[p], at(dirname, p1));
        if cfg!(windows) && c1 == b'\\' {
            if !is_separator(c) {
                break;
            }
            dirname_lcp += 1;
        } else if c != c1 {
            break;
        } else if !cfg!(windows) && c == b'/' {
            dirname_lcp += 1;
        }
        p += 1;
        p1 += 1;
    }
    // dirname = "abc", path = "abc/test.h"; an empty dirname shares nothing
    if p1 > 0 && at(dirname, p1) == 0 && is_separator(at(path, p)) {
        dirname_lcp += 1;
    }

    let dirname_same = filename_start - p == 1 || (dirname.is_empty() && filename_start == 0);
    if basename_same && dirname_same {
        return 0;
    }
    if filename_start == 0 && dirname.is_empty() {
        dirname_lcp = 1;
    }

    (((filename_prefix + 1) << 24) | (dirname_lcp << 12) | (u32::from(dirname_same) << 11) | filename_lcp)
        .wrapping_add(suffix_diff << 2)
        .wrapping_sub(path.len() as u32)
}
