#[allow(dead_code)]
mod common;

use bitfuzz::prelude::*;

/// Spans are increasing and disjoint and spell the pattern, case folded
fn assert_spans_spell(text: &[u8], pattern: &str, highlights: &Highlights) {
    let mut end = 0;
    let mut spelled = Vec::new();
    for span in highlights {
        let range = span.range();
        assert!(range.start >= end, "{:?} overlaps in {}", highlights, String::from_utf8_lossy(text));
        assert!(span.len > 0);
        spelled.extend(text[range.clone()].iter().map(u8::to_ascii_lowercase));
        end = range.end;
    }
    assert_eq!(spelled, pattern.as_bytes(), "{}", String::from_utf8_lossy(text));
}

fn check_all(lines: &[impl AsRef<[u8]> + Sync], query: &str, mode: MatchMode, engine: &mut FuzzyEngine) -> usize {
    let pattern = Pattern::new(query);
    let ranked = engine.match_all(lines, &pattern, mode, true).unwrap();
    let spans = engine.highlights(&ranked.items, &pattern, mode).unwrap();
    assert_eq!(spans.len(), ranked.len());
    for (line, highlights) in ranked.items.iter().zip(&spans) {
        assert_spans_spell(line.as_ref(), query, highlights);
    }
    ranked.len()
}

#[test]
fn spans_spell_the_pattern_on_paths() {
    let mut engine = FuzzyEngine::with_cpu_count(2);
    for query in ["src", "eng", "mod", "fm", "rs", "ew", "srcmod", "s"] {
        for mode in [MatchMode::FullPath, MatchMode::NameOnly] {
            assert!(check_all(&common::PATHS, query, mode, &mut engine) > 0, "{query}");
        }
    }
}

#[test]
fn spans_spell_the_pattern_on_random_lines() {
    let lines = common::random_lines(20_000);
    let mut engine = FuzzyEngine::with_cpu_count(4);
    for query in ["ab", "a_b", "x.y", "abcd", "q/"] {
        for mode in [MatchMode::FullPath, MatchMode::NameOnly] {
            check_all(&lines, query, mode, &mut engine);
        }
    }
}

#[test]
fn best_alignment_is_highlighted() {
    let mut engine = FuzzyEngine::with_cpu_count(1);
    let items = ["src/fuzzy_matcher/mod.rs", "src/engine/queue.rs"];
    let spans = engine.highlights(&items, &Pattern::new("mod"), MatchMode::FullPath);
    assert!(matches!(spans, Err(EngineError::HighlightMismatch { index: 1 })));

    let spans = engine.highlights(&items[..1], &Pattern::new("mod"), MatchMode::FullPath).unwrap();
    assert_eq!(spans[0].to_pairs(), vec![(19, 3)]);
}

#[test]
fn empty_pattern_has_no_spans() {
    let mut engine = FuzzyEngine::with_cpu_count(1);
    let spans = engine.highlights(&common::PATHS, &Pattern::new(""), MatchMode::FullPath).unwrap();
    assert!(spans.iter().all(Highlights::is_empty));
}
