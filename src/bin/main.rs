extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate shlex;

use std::env;
use std::io::{self, BufWriter, Read, Write};

use bitfuzz::prelude::*;
use clap::{Parser, ValueEnum};
use color_eyre::eyre::Result;

//------------------------------------------------------------------------------
fn main() {
    env_logger::builder().format_timestamp_nanos().init();
    if let Err(err) = color_eyre::install() {
        warn!("could not install error report hooks: {err}");
    }

    match real_main() {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            // downstream pipe closed, e.g. `bfz foo | head`
            if err
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
            {
                std::process::exit(0)
            }
            eprintln!("{err:?}");
            std::process::exit(2)
        }
    }
}

/// Rank lines of stdin against a fuzzy query
#[derive(Parser, Debug)]
#[command(name = "bfz", version, about)]
struct BinOptions {
    /// The query, matched as an ordered subsequence
    #[arg(default_value = "")]
    query: String,

    /// Where word boundaries are rewarded
    #[arg(long, short = 'm', value_enum, default_value_t = MatchMode::FullPath)]
    mode: MatchMode,

    /// Keep input order instead of ranking
    #[arg(long)]
    no_sort: bool,

    /// Only score the part of each line this kind of input keeps
    #[arg(long, short = 'c', value_enum)]
    category: Option<CategoryArg>,

    /// grep lines carry a column number (`path:line:col:text`)
    #[arg(long, requires = "category")]
    with_column: bool,

    /// Every whitespace separated word of the query must match
    #[arg(long)]
    and: bool,

    /// Rank lines as renames of this path; the query is ignored
    #[arg(long, value_name = "PATH")]
    rename: Option<String>,

    /// Bytes of decoration in front of each path, used with --rename
    #[arg(long, default_value_t = 0)]
    icon_len: usize,

    /// Color the matched bytes
    #[arg(long)]
    highlight: bool,

    /// Print the weight in front of each line
    #[arg(long)]
    print_score: bool,

    /// Read input delimited by NUL instead of newline
    #[arg(long)]
    read0: bool,

    /// Print output delimited by NUL instead of newline
    #[arg(long)]
    print0: bool,

    #[command(flatten)]
    engine: EngineOptions,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
#[clap(rename_all = "snake_case")]
enum CategoryArg {
    /// grep / ripgrep output, the text after `path:line:`
    Rg,
    /// ctags file, the tag name
    Tag,
    /// file paths, the basename
    File,
    /// gtags output, the text after `path<TAB>line<TAB>`
    Gtags,
    /// buffer lines, the text before the last TAB
    Line,
}

impl BinOptions {
    fn category(&self) -> Option<Category> {
        self.category.map(|category| match category {
            CategoryArg::Rg => Category::Rg(RgOptions {
                has_column: self.with_column,
                ..Default::default()
            }),
            CategoryArg::Tag => Category::Tag,
            CategoryArg::File => Category::File,
            CategoryArg::Gtags => Category::Gtags(GtagsOptions::default()),
            CategoryArg::Line => Category::Line,
        })
    }
}

/// Command line arguments, with `BFZ_DEFAULT_OPTIONS` inserted after the program name
fn parse_args() -> BinOptions {
    let mut args: Vec<String> = env::args().take(1).collect();
    args.extend(
        env::var("BFZ_DEFAULT_OPTIONS")
            .ok()
            .and_then(|val| shlex::split(&val))
            .unwrap_or_default(),
    );
    args.extend(env::args().skip(1));
    BinOptions::parse_from(args)
}

fn read_input() -> io::Result<Vec<u8>> {
    let mut input = Vec::new();
    io::stdin().lock().read_to_end(&mut input)?;
    debug!("read {} bytes of input", input.len());
    Ok(input)
}

fn split_lines(input: &[u8], delimiter: u8) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = input.split(|&b| b == delimiter).collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if delimiter == b'\n' {
        for line in &mut lines {
            if let Some(stripped) = line.strip_suffix(b"\r") {
                *line = stripped;
            }
        }
    }
    lines
}

//------------------------------------------------------------------------------
fn real_main() -> Result<i32> {
    let opts = parse_args();
    let input = read_input()?;
    let lines = split_lines(&input, if opts.read0 { b'\0' } else { b'\n' });
    let ending: &[u8] = if opts.print0 { b"\0" } else { b"\n" };
    let sort = !opts.no_sort;

    let mut engine = FuzzyEngine::new(opts.engine.clone());
    let mut stdout = BufWriter::new(io::stdout().lock());

    //------------------------------------------------------------------------------
    // rename mode
    if let Some(path) = &opts.rename {
        let target = RenameTarget::from_path(path);
        let ranked = engine.guess_best_rename(&lines, &target, opts.icon_len, sort)?;
        for (weight, line) in ranked.iter() {
            if opts.print_score {
                write!(stdout, "{weight}\t")?;
            }
            stdout.write_all(line)?;
            stdout.write_all(ending)?;
        }
        stdout.flush()?;
        return Ok(if ranked.is_empty() { 1 } else { 0 });
    }

    //------------------------------------------------------------------------------
    // filter mode
    let pattern = Pattern::new(&opts.query);
    let category = opts.category();
    let ranked = match (&category, opts.and) {
        (_, true) => engine.match_and(&lines, opts.query.as_bytes(), opts.mode, sort)?,
        (Some(category), false) => engine.match_part(&lines, &pattern, category, opts.mode, sort)?,
        (None, false) => engine.match_all(&lines, &pattern, opts.mode, sort)?,
    };
    debug!("{} of {} lines matched", ranked.len(), lines.len());

    let spans = if opts.highlight && !opts.and {
        let digests: Vec<&[u8]> = ranked
            .items
            .iter()
            .map(|line| category.as_ref().map_or(**line, |c| c.digest(line)))
            .collect();
        Some(engine.highlights(&digests, &pattern, opts.mode)?)
    } else {
        if opts.highlight {
            warn!("--highlight is not supported together with --and");
        }
        None
    };

    for (i, (weight, line)) in ranked.iter().enumerate() {
        if opts.print_score {
            write!(stdout, "{weight}\t")?;
        }
        match &spans {
            Some(spans) => write_highlighted(&mut stdout, line, category.as_ref(), &spans[i])?,
            None => stdout.write_all(line)?,
        }
        stdout.write_all(ending)?;
    }
    stdout.flush()?;

    Ok(if ranked.is_empty() { 1 } else { 0 })
}

fn write_highlighted(out: &mut impl Write, line: &[u8], category: Option<&Category>, spans: &Highlights) -> io::Result<()> {
    // digests are subslices of the line
    let offset = category.map_or(0, |c| c.digest(line).as_ptr() as usize - line.as_ptr() as usize);
    let mut pos = 0;
    for span in spans {
        let range = span.range();
        let (start, end) = (range.start + offset, range.end + offset);
        out.write_all(&line[pos..start])?;
        out.write_all(b"\x1b[32m")?;
        out.write_all(&line[start..end])?;
        out.write_all(b"\x1b[0m")?;
        pos = end;
    }
    out.write_all(&line[pos..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_trailing_delimiter() {
        assert_eq!(split_lines(b"a\r\nb\n", b'\n'), vec![&b"a"[..], b"b"]);
        assert_eq!(split_lines(b"a\0b", b'\0'), vec![&b"a"[..], b"b"]);
        assert!(split_lines(b"", b'\n').is_empty());
    }

    #[test]
    fn highlighted_output() {
        let pattern = Pattern::new("fb");
        let h = BitMatcher::new(&pattern, MatchMode::FullPath)
            .fuzzy_highlights(b"src/foo_bar.rs")
            .unwrap();
        let mut out = Vec::new();
        write_highlighted(&mut out, b"src/foo_bar.rs", None, &h).unwrap();
        assert_eq!(out, b"src/\x1b[32mf\x1b[0moo_\x1b[32mb\x1b[0mar.rs");
    }

    #[test]
    fn options_parse() {
        let opts = BinOptions::parse_from(["bfz", "-t", "3", "--mode", "name_only", "--category", "rg", "--with-column", "abc"]);
        assert_eq!(opts.query, "abc");
        assert_eq!(opts.engine.cpu_count, 3);
        assert_eq!(opts.mode, MatchMode::NameOnly);
        assert!(matches!(opts.category(), Some(Category::Rg(RgOptions { has_column: true, .. }))));
    }
}
