//! Ranked results and the ordering primitives of the batch engine.
//!
//! Every ordering here is descending by weight and stable: equal weights
//! keep input order, so a result never depends on how the work was split.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::Result;

/// A weight results are ranked by
pub trait Weight: Copy + Debug + Send + Sync + 'static {
    /// Total order, ascending
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

impl Weight for f32 {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Weight for u32 {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Weight of the candidate at `index` in the input
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ranked<W> {
    /// The weight
    pub weight: W,
    /// Position in the input
    pub index: u32,
}

/// Weights paired with references to the candidates they rank
#[derive(Debug, Clone)]
pub struct RankedList<'a, T: ?Sized, W> {
    /// Weights, parallel to `items`
    pub weights: Vec<W>,
    /// Candidates
    pub items: Vec<&'a T>,
}

impl<T: ?Sized, W> Default for RankedList<'_, T, W> {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<'a, T: ?Sized, W: Copy> RankedList<'a, T, W> {
    /// Number of results
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over `(weight, item)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (W, &'a T)> + '_ {
        self.weights.iter().copied().zip(self.items.iter().copied())
    }
}

/// Weights paired with input positions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedList<W> {
    /// Weights, parallel to `indices`
    pub weights: Vec<W>,
    /// Positions in the input
    pub indices: Vec<u32>,
}

impl<W> IndexedList<W> {
    /// Number of results
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// `Vec::with_capacity` reporting allocation failure instead of aborting
pub(crate) fn try_with_capacity<X>(n: usize) -> Result<Vec<X>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    Ok(v)
}

/// Stable sort, highest weight first
pub fn sort_descending<W: Weight>(ranked: &mut [Ranked<W>]) {
    ranked.sort_by(|a, b| b.weight.rank_cmp(&a.weight));
}

/// Merges the sorted runs `run[..left_len]` and `run[left_len..]` in place.
///
/// The right run is copied to `scratch` (at least as long as it) and the merge
/// fills `run` from the back. On equal weights the left element ends up first.
pub fn merge_adjacent<W: Weight>(run: &mut [Ranked<W>], left_len: usize, scratch: &mut [Ranked<W>]) {
    let right_len = run.len() - left_len;
    let scratch = &mut scratch[..right_len];
    scratch.copy_from_slice(&run[left_len..]);

    let (mut i, mut j, mut k) = (left_len, right_len, run.len());
    while i > 0 && j > 0 {
        k -= 1;
        if run[i - 1].weight.rank_cmp(&scratch[j - 1].weight) == Ordering::Less {
            run[k] = run[i - 1];
            i -= 1;
        } else {
            run[k] = scratch[j - 1];
            j -= 1;
        }
    }
    // whatever is left of the left run is already in place
    run[..j].copy_from_slice(&scratch[..j]);
}

/// Merges two lists sorted by descending weight.
///
/// On equal weights the element of `b` comes first. An empty side returns the
/// other one unchanged.
pub fn merge_ranked<'a, T: ?Sized, W: Weight>(
    a: RankedList<'a, T, W>,
    b: RankedList<'a, T, W>,
) -> Result<RankedList<'a, T, W>> {
    if a.is_empty() {
        return Ok(b);
    }
    if b.is_empty() {
        return Ok(a);
    }

    let total = a.len() + b.len();
    let mut merged = RankedList {
        weights: try_with_capacity(total)?,
        items: try_with_capacity(total)?,
    };
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a.weights[i].rank_cmp(&b.weights[j]) == Ordering::Greater {
            merged.weights.push(a.weights[i]);
            merged.items.push(a.items[i]);
            i += 1;
        } else {
            merged.weights.push(b.weights[j]);
            merged.items.push(b.items[j]);
            j += 1;
        }
    }
    merged.weights.extend_from_slice(&a.weights[i..]);
    merged.items.extend_from_slice(&a.items[i..]);
    merged.weights.extend_from_slice(&b.weights[j..]);
    merged.items.extend_from_slice(&b.items[j..]);
    trace!("merged {} + {} ranked results", a.len(), b.len());
    Ok(merged)
}
