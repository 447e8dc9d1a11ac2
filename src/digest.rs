//! Category pre-filters.
//!
//! Lines produced by search tools carry prefixes that should not take part in
//! matching (`src/lib.rs:12:` in grep output, the fields after a tag name in a
//! tags file). A [`Category`] cuts a line down to the part worth scoring. The
//! digest is always a subslice of the line.

use memchr::{memchr, memchr_iter, memrchr, memrchr2};

/// Options of ripgrep-style `path:line:[col:]text` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RgOptions {
    /// Context lines (`path-line-text`) and group separators may appear
    pub display_multi: bool,
    /// Line printed between groups of context, digested to nothing
    pub separator: Vec<u8>,
    /// Lines carry a column number after the line number
    pub has_column: bool,
}

/// Flavour of a gtags listing
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GtagsFormat {
    /// `path<TAB>line<TAB>text`, the text is matched
    #[default]
    CtagsMod,
    /// `tag<TAB>path<TAB>line`, the tag is matched
    Ctags,
    /// `tag line path text`, the tag is matched
    CtagsX,
}

/// Options of a gtags listing
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GtagsOptions {
    /// Listing flavour
    pub format: GtagsFormat,
    /// Match against the whole line instead of the tag
    pub match_path: bool,
}

/// What kind of line is being matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    /// ripgrep / grep output
    Rg(RgOptions),
    /// ctags file line, the tag before the first TAB is matched
    Tag,
    /// File path, only the basename is matched
    File,
    /// gtags output
    Gtags(GtagsOptions),
    /// Buffer line followed by a TAB and location metadata
    Line,
}

impl Category {
    /// The part of `line` that should be scored
    pub fn digest<'a>(&self, line: &'a [u8]) -> &'a [u8] {
        match self {
            Category::Rg(options) => rg_digest(line, options),
            Category::Tag => memchr(b'\t', line).map_or(&line[..0], |tab| &line[..tab]),
            Category::File => memrchr2(b'/', b'\\', line).map_or(line, |sep| &line[sep + 1..]),
            Category::Gtags(options) => gtags_digest(line, options),
            Category::Line => memrchr(b'\t', line).map_or(line, |tab| &line[..tab]),
        }
    }
}

fn rg_digest<'a>(line: &'a [u8], options: &RgOptions) -> &'a [u8] {
    let prefix_colons = if options.has_column { 3 } else { 2 };

    if options.display_multi {
        if line == options.separator.as_slice() {
            return &line[..0];
        }
        let (mut colon, mut minus) = (0, 0);
        for (i, &c) in line.iter().enumerate() {
            match c {
                b':' => {
                    minus = 0;
                    colon += 1;
                    if colon == prefix_colons || colon == 3 {
                        return &line[i + 1..];
                    }
                }
                // context line: path-line-text
                b'-' => {
                    colon = 0;
                    minus += 1;
                    if minus == 2 {
                        return &line[i + 1..];
                    }
                }
                c if !c.is_ascii_digit() && colon + minus > 0 => {
                    colon = 0;
                    minus = 0;
                }
                _ => {}
            }
        }
    } else {
        let mut colon = 0;
        for (i, &c) in line.iter().enumerate() {
            if c == b':' {
                colon += 1;
                if colon == prefix_colons || colon == 3 {
                    return &line[i + 1..];
                }
            } else if !c.is_ascii_digit() && colon > 0 {
                colon = 0;
            }
        }
    }
    line
}

fn gtags_digest<'a>(line: &'a [u8], options: &GtagsOptions) -> &'a [u8] {
    if options.match_path {
        return line;
    }
    match options.format {
        GtagsFormat::CtagsMod => memchr_iter(b'\t', line).nth(1).map_or(line, |tab| &line[tab + 1..]),
        GtagsFormat::Ctags => memchr(b'\t', line).map_or(line, |tab| &line[..tab]),
        GtagsFormat::CtagsX => memchr(b' ', line).map_or(line, |space| &line[..space]),
    }
}
