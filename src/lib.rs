//! bitfuzz is a fuzzy subsequence ranking library.
//!
//! A query matches a candidate when its bytes occur in the candidate in
//! order. Matches are weighed with a bit-parallel search that rewards long
//! contiguous runs starting on word boundaries, and a [`FuzzyEngine`] ranks
//! whole candidate lists on a pool of worker threads.
//!
//! # Examples
//!
//! ```
//! use bitfuzz::prelude::*;
//!
//! let mut engine = FuzzyEngine::with_cpu_count(2);
//! let candidates = ["src/engine/mod.rs", "src/pattern.rs", "README.md"];
//! let pattern = Pattern::new("eng");
//!
//! let ranked = engine
//!     .match_all(&candidates, &pattern, MatchMode::FullPath, true)
//!     .unwrap();
//! assert_eq!(ranked.items, vec![&"src/engine/mod.rs"]);
//!
//! let spans = engine.highlights(&ranked.items, &pattern, MatchMode::FullPath).unwrap();
//! assert_eq!(spans[0].to_pairs(), vec![(5, 3)]);
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

pub mod digest;
mod engine;
pub mod error;
pub mod fuzzy_matcher;
pub mod options;
pub mod path_weight;
pub mod pattern;
pub mod prelude;
pub mod ranked;

pub use crate::digest::Category;
pub use crate::engine::FuzzyEngine;
pub use crate::error::{EngineError, Result};
pub use crate::fuzzy_matcher::{BitMatcher, FuzzyMatcher, Highlights, MIN_WEIGHT, MatchMode, Span};
pub use crate::options::{EngineOptions, EngineOptionsBuilder};
pub use crate::path_weight::RenameTarget;
pub use crate::pattern::Pattern;
pub use crate::ranked::{IndexedList, Ranked, RankedList, Weight, merge_ranked};
