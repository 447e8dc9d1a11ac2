use rand::RngExt as _;
use rand::distr::Alphanumeric;

pub const PATHS: [&str; 24] = [
    "src/lib.rs",
    "src/prelude.rs",
    "src/error.rs",
    "src/options.rs",
    "src/pattern.rs",
    "src/digest.rs",
    "src/ranked.rs",
    "src/path_weight.rs",
    "src/bin/main.rs",
    "src/engine/mod.rs",
    "src/engine/queue.rs",
    "src/engine/task.rs",
    "src/fuzzy_matcher/mod.rs",
    "src/fuzzy_matcher/text.rs",
    "src/fuzzy_matcher/weight.rs",
    "src/fuzzy_matcher/highlight.rs",
    "tests/common/mod.rs",
    "tests/engine.rs",
    "tests/matcher.rs",
    "tests/highlighting.rs",
    "benches/filter.rs",
    "benches/matcher_micro.rs",
    "Cargo.toml",
    "README.md",
];

/// Random path-like lines: alphanumeric runs joined by `/`, `_` and `.`
pub fn random_lines(n: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| {
            let len = rng.random_range(4..48);
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(|b| match b {
                    b'0' | b'Z' => '/',
                    b'1' => '_',
                    b'2' => '.',
                    b => char::from(b),
                })
                .collect()
        })
        .collect()
}
