use bitfuzz::prelude::*;

fn eager_engine(cpu_count: usize) -> FuzzyEngine {
    let options = EngineOptionsBuilder::default()
        .cpu_count(cpu_count)
        .sort_parallel_threshold(64)
        .materialize_parallel_threshold(64)
        .sort_chunk_floor(16)
        .materialize_chunk_floor(16)
        .build()
        .unwrap();
    FuzzyEngine::new(options)
}

// equal weights keep input order, however the sort was split
#[test]
fn ties_keep_input_order() {
    let distinct = ["src/abc.rs", "abc", "a/b/c", "xabcx", "nothing"];
    let lines: Vec<&str> = (0..10_000).map(|i| distinct[(i * 7) % distinct.len()]).collect();
    let pattern = Pattern::new("abc");

    for mut engine in [FuzzyEngine::with_cpu_count(1), eager_engine(3), eager_engine(8)] {
        let ranked = engine.match_all_indexed(&lines, &pattern, MatchMode::FullPath, true).unwrap();
        assert_eq!(ranked.len(), 8_000);
        for pair in ranked.weights.windows(2).zip(ranked.indices.windows(2)) {
            let (w, i) = pair;
            assert!(w[0] > w[1] || (w[0] == w[1] && i[0] < i[1]));
        }
    }
}

#[test]
fn merge_prefers_second_list_on_ties() {
    let a = RankedList {
        weights: vec![3.0, 2.0],
        items: vec!["a3", "a2"],
    };
    let b = RankedList {
        weights: vec![2.0, 1.0],
        items: vec!["b2", "b1"],
    };
    let merged = merge_ranked(a, b).unwrap();
    assert_eq!(merged.items, vec!["a3", "b2", "a2", "b1"]);
}
