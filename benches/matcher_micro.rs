//! Microbenchmark that isolates the matcher from all other overhead
//! (threading, sorting, materialization).

use criterion::{Criterion, criterion_group, criterion_main};
use rand::RngExt as _;
use rand::distr::Alphanumeric;

use bitfuzz::fuzzy_matcher::{BitMatcher, FuzzyMatcher, MatchMode};
use bitfuzz::pattern::Pattern;

fn random_lines(n: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| {
            let len = rng.random_range(8..80);
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(|b| if b == b'0' { '/' } else { char::from(b) })
                .collect()
        })
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let lines = random_lines(100_000);

    for (name, query, mode) in [
        ("micro_weight_short", "test", MatchMode::FullPath),
        ("micro_weight_name_only", "test", MatchMode::NameOnly),
        ("micro_weight_single_byte", "t", MatchMode::FullPath),
        ("micro_weight_long", "abcdefghijkl", MatchMode::FullPath),
    ] {
        let pattern = Pattern::new(query);
        c.bench_function(name, |b| {
            let m = BitMatcher::new(&pattern, mode);
            b.iter(|| {
                let mut count = 0u64;
                for line in &lines {
                    if m.fuzzy_match(line.as_bytes()).is_some() {
                        count += 1;
                    }
                }
                count
            });
        });
    }

    c.bench_function("micro_highlights", |b| {
        let pattern = Pattern::new("test");
        let m = BitMatcher::new(&pattern, MatchMode::FullPath);
        b.iter(|| lines.iter().filter_map(|line| m.fuzzy_highlights(line.as_bytes())).count());
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_matcher
);
criterion_main!(benches);
