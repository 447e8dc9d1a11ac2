//! Convenience re-exports of commonly used types.
//!
//! `use bitfuzz::prelude::*;` brings the engine, its options and the types of
//! its inputs and outputs into scope.

pub use crate::digest::{Category, GtagsFormat, GtagsOptions, RgOptions};
pub use crate::fuzzy_matcher::{BitMatcher, FuzzyMatcher, Highlights, MIN_WEIGHT, MatchMode, Span};
pub use crate::options::{EngineOptions, EngineOptionsBuilder, default_cpu_count};
pub use crate::path_weight::{RenameTarget, path_weight};
pub use crate::pattern::Pattern;
pub use crate::ranked::{IndexedList, Ranked, RankedList, Weight, merge_ranked};
pub use crate::{EngineError, FuzzyEngine};
