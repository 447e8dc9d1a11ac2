//! Units of work handed to the worker pool.

use crate::digest::Category;
use crate::fuzzy_matcher::{BitMatcher, FuzzyMatcher, Highlights};
use crate::path_weight::{RenameTarget, path_weight};
use crate::ranked::{Ranked, Weight, merge_adjacent, sort_descending};

/// One chunk of a batch call.
///
/// Every variant carries the slices it reads and the disjoint slices it
/// writes, so tasks of one batch never touch the same output slot.
pub(crate) enum Task<'env, 'a: 'env, T, W> {
    /// Weigh candidates, `base` is the input position of `items[0]`
    Score {
        items: &'a [T],
        base: u32,
        matcher: BitMatcher<'env>,
        digest: Option<&'env Category>,
        out: &'env mut [Ranked<f32>],
    },
    /// Compute highlight spans of candidates
    Highlight {
        items: &'a [T],
        matcher: BitMatcher<'env>,
        out: &'env mut [Option<Highlights>],
    },
    /// Weigh candidate paths as renames of `target`
    PathWeight {
        items: &'a [T],
        base: u32,
        target: &'env RenameTarget,
        icon_prefix_len: usize,
        out: &'env mut [Ranked<u32>],
    },
    /// Sort one run
    Sort { run: &'env mut [Ranked<W>] },
    /// Merge the sorted halves `run[..left_len]` and `run[left_len..]`
    Merge {
        run: &'env mut [Ranked<W>],
        left_len: usize,
        scratch: &'env mut [Ranked<W>],
    },
    /// Resolve ranked records to weights and candidate references
    Materialize {
        ranked: &'env [Ranked<W>],
        items: &'a [T],
        weights: &'env mut [W],
        refs: &'env mut [&'a T],
    },
    /// Resolve ranked records to weights and input positions
    MaterializeIndices {
        ranked: &'env [Ranked<W>],
        weights: &'env mut [W],
        indices: &'env mut [u32],
    },
}

impl<T: AsRef<[u8]> + Sync, W: Weight> Task<'_, '_, T, W> {
    pub fn run(self) {
        match self {
            Task::Score {
                items,
                base,
                matcher,
                digest,
                out,
            } => {
                for (i, (item, slot)) in items.iter().zip(out).enumerate() {
                    let line = item.as_ref();
                    let text = digest.map_or(line, |category| category.digest(line));
                    *slot = Ranked {
                        weight: matcher.fuzzy_weight(text),
                        index: base + i as u32,
                    };
                }
            }
            Task::Highlight { items, matcher, out } => {
                for (item, slot) in items.iter().zip(out) {
                    *slot = matcher.fuzzy_highlights(item.as_ref());
                }
            }
            Task::PathWeight {
                items,
                base,
                target,
                icon_prefix_len,
                out,
            } => {
                for (i, (item, slot)) in items.iter().zip(out).enumerate() {
                    let path = item.as_ref().get(icon_prefix_len..).unwrap_or_default();
                    *slot = Ranked {
                        weight: path_weight(target, path),
                        index: base + i as u32,
                    };
                }
            }
            Task::Sort { run } => sort_descending(run),
            Task::Merge { run, left_len, scratch } => merge_adjacent(run, left_len, scratch),
            Task::Materialize {
                ranked,
                items,
                weights,
                refs,
            } => {
                for ((record, weight), slot) in ranked.iter().zip(weights).zip(refs) {
                    *weight = record.weight;
                    *slot = &items[record.index as usize];
                }
            }
            Task::MaterializeIndices {
                ranked,
                weights,
                indices,
            } => {
                for ((record, weight), index) in ranked.iter().zip(weights).zip(indices) {
                    *weight = record.weight;
                    *index = record.index;
                }
            }
        }
    }
}
