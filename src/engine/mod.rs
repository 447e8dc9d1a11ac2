//! The batch engine.
//!
//! A [`FuzzyEngine`] splits a candidate list into chunks, weighs the chunks
//! on its worker pool, drops the candidates that do not match and ranks the
//! rest. Ranking is a stable sort, run on the calling thread for small result
//! sets and as a parallel sort of chunks followed by merge passes otherwise.
//! The outcome does not depend on the number of workers.
//!
//! With a single worker, or when a batch fits in one chunk, everything runs
//! on the calling thread and the pool is never started.

mod queue;
mod task;

use crate::digest::Category;
use crate::error::{EngineError, Result};
use crate::fuzzy_matcher::{BitMatcher, Highlights, MIN_WEIGHT, MatchMode};
use crate::options::EngineOptions;
use crate::path_weight::RenameTarget;
use crate::pattern::Pattern;
use crate::ranked::{IndexedList, Ranked, RankedList, Weight, sort_descending, try_with_capacity};

use self::queue::WorkerPool;
use self::task::Task;

/// At most this many chunks per worker
const TASKS_PER_WORKER: usize = 8;

/// How a batch of `n` candidates is split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkPlan {
    chunk: usize,
    tasks: usize,
}

impl ChunkPlan {
    fn new(n: usize, cpu_count: usize) -> Self {
        let max_tasks = TASKS_PER_WORKER * cpu_count;
        let chunk = n.div_ceil(max_tasks).max(1);
        if chunk == 1 || cpu_count == 1 {
            return Self { chunk: n.max(1), tasks: 1 };
        }
        Self {
            chunk,
            tasks: n.div_ceil(chunk),
        }
    }
}

/// Chunk length for `count` records over `tasks` tasks, halving the task
/// count when the chunks would be shorter than `floor`.
fn split_chunk(count: usize, tasks: usize, floor: usize) -> usize {
    let chunk = count.div_ceil(tasks);
    if chunk < floor && tasks > 1 {
        count.div_ceil(tasks / 2)
    } else {
        chunk
    }
}

/// Candidate positions are stored as `u32`.
fn check_candidate_count(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| EngineError::TooManyCandidates { count })
}

/// Multi-threaded fuzzy ranking of candidate lists
///
/// All batch calls take `&mut self`: one engine serves one caller at a time.
/// Create one engine per thread that needs to issue batches concurrently.
pub struct FuzzyEngine {
    options: EngineOptions,
    pool: Option<WorkerPool>,
}

impl Default for FuzzyEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl FuzzyEngine {
    /// Create an engine; worker threads are started by the first batch call
    /// that needs them.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options: options.build(),
            pool: None,
        }
    }

    /// Create an engine with `cpu_count` workers and default thresholds
    pub fn with_cpu_count(cpu_count: usize) -> Self {
        Self::new(EngineOptions::with_cpu_count(cpu_count))
    }

    /// The options this engine runs with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Stops the worker threads. The next batch call starts them again.
    pub fn close(&mut self) {
        if self.pool.take().is_some() {
            debug!("engine closed");
        }
    }

    fn pool(&mut self) -> Result<&mut WorkerPool> {
        let pool = match self.pool.take() {
            Some(pool) => pool,
            None => {
                debug!("starting worker pool of {} threads", self.options.cpu_count);
                WorkerPool::new(self.options.cpu_count, &self.options.thread_name_prefix)?
            }
        };
        Ok(self.pool.insert(pool))
    }

    /// Runs `tasks`, on the calling thread when there is only one.
    fn run_tasks<'env, 'a: 'env, T, W>(&mut self, tasks: Vec<Task<'env, 'a, T, W>>) -> Result<()>
    where
        T: AsRef<[u8]> + Sync + 'a,
        W: Weight,
    {
        if tasks.len() <= 1 {
            tasks.into_iter().for_each(Task::run);
            return Ok(());
        }
        self.pool()?.run(tasks.into_iter().map(|task| move || task.run()))
    }

    //--------------------------------------------------------------------------
    // pipeline stages

    /// Weighs every candidate and keeps the matches, in input order.
    fn score<T>(
        &mut self,
        items: &[T],
        matcher: BitMatcher<'_>,
        digest: Option<&Category>,
    ) -> Result<(Vec<Ranked<f32>>, ChunkPlan)>
    where
        T: AsRef<[u8]> + Sync,
    {
        check_candidate_count(items.len())?;
        let plan = ChunkPlan::new(items.len(), self.options.cpu_count);
        debug!(
            "scoring {} candidates in {} chunks of {}",
            items.len(),
            plan.tasks,
            plan.chunk
        );

        let mut results = try_with_capacity(items.len())?;
        results.resize(items.len(), Ranked {
            weight: MIN_WEIGHT,
            index: 0,
        });
        let tasks: Vec<Task<'_, '_, T, f32>> = items
            .chunks(plan.chunk)
            .zip(results.chunks_mut(plan.chunk))
            .enumerate()
            .map(|(i, (items, out))| Task::Score {
                items,
                // below `items.len()`, which fits in u32
                base: (i * plan.chunk) as u32,
                matcher,
                digest,
                out,
            })
            .collect();
        self.run_tasks(tasks)?;

        results.retain(|r| r.weight > MIN_WEIGHT);
        trace!("{} of {} candidates matched", results.len(), items.len());
        Ok((results, plan))
    }

    /// Sorts `ranked` by descending weight, stable.
    ///
    /// Returns the number of tasks the output should be materialized with.
    fn rank<T, W>(&mut self, ranked: &mut [Ranked<W>], tasks: usize) -> Result<usize>
    where
        T: AsRef<[u8]> + Sync,
        W: Weight,
    {
        let count = ranked.len();
        if tasks == 1 || count < self.options.sort_parallel_threshold {
            sort_descending(ranked);
            return Ok(tasks);
        }

        let mut chunk = split_chunk(count, tasks, self.options.sort_chunk_floor);
        let tasks = count.div_ceil(chunk);
        debug!("sorting {count} results in {tasks} runs of {chunk}");

        let sorts: Vec<Task<'_, '_, T, W>> = ranked.chunks_mut(chunk).map(|run| Task::Sort { run }).collect();
        self.run_tasks(sorts)?;

        // each merge of a pass copies its right run, at most `chunk` long, to
        // its own `chunk` wide window of the scratch buffer
        let scratch_len = count.div_ceil(2);
        let mut scratch = try_with_capacity(scratch_len)?;
        scratch.resize(scratch_len, ranked[0]);

        while chunk < count {
            let width = chunk * 2;
            let merges: Vec<Task<'_, '_, T, W>> = ranked
                .chunks_mut(width)
                .zip(scratch.chunks_mut(chunk))
                .filter(|(run, _)| run.len() > chunk)
                .map(|(run, scratch)| Task::Merge {
                    run,
                    left_len: chunk,
                    scratch,
                })
                .collect();
            trace!("merge pass: {} merges of runs of {chunk}", merges.len());
            self.run_tasks(merges)?;
            chunk = width;
        }
        Ok(tasks)
    }

    fn materialize_chunk(&self, count: usize, tasks: usize) -> usize {
        if tasks == 1 || count < self.options.materialize_parallel_threshold {
            count
        } else {
            split_chunk(count, tasks, self.options.materialize_chunk_floor)
        }
    }

    /// Resolves non-empty `ranked` to weights and references into `items`.
    fn materialize<'a, T, W>(
        &mut self,
        ranked: &[Ranked<W>],
        items: &'a [T],
        tasks: usize,
    ) -> Result<RankedList<'a, T, W>>
    where
        T: AsRef<[u8]> + Sync,
        W: Weight,
    {
        let count = ranked.len();
        let chunk = self.materialize_chunk(count, tasks);

        let mut weights = try_with_capacity(count)?;
        weights.resize(count, ranked[0].weight);
        let mut refs = try_with_capacity(count)?;
        refs.resize(count, &items[ranked[0].index as usize]);

        let jobs: Vec<Task<'_, 'a, T, W>> = ranked
            .chunks(chunk)
            .zip(weights.chunks_mut(chunk))
            .zip(refs.chunks_mut(chunk))
            .map(|((ranked, weights), refs)| Task::Materialize {
                ranked,
                items,
                weights,
                refs,
            })
            .collect();
        self.run_tasks(jobs)?;
        Ok(RankedList { weights, items: refs })
    }

    /// Resolves non-empty `ranked` to weights and input positions.
    fn materialize_indices<T, W>(&mut self, ranked: &[Ranked<W>], tasks: usize) -> Result<IndexedList<W>>
    where
        T: AsRef<[u8]> + Sync,
        W: Weight,
    {
        let count = ranked.len();
        let chunk = self.materialize_chunk(count, tasks);

        let mut weights = try_with_capacity(count)?;
        weights.resize(count, ranked[0].weight);
        let mut indices = try_with_capacity(count)?;
        indices.resize(count, 0);

        let jobs: Vec<Task<'_, '_, T, W>> = ranked
            .chunks(chunk)
            .zip(weights.chunks_mut(chunk))
            .zip(indices.chunks_mut(chunk))
            .map(|((ranked, weights), indices)| Task::MaterializeIndices {
                ranked,
                weights,
                indices,
            })
            .collect();
        self.run_tasks(jobs)?;
        Ok(IndexedList { weights, indices })
    }

    fn ranked_list<'a, T, W>(
        &mut self,
        mut ranked: Vec<Ranked<W>>,
        items: &'a [T],
        tasks: usize,
        sort: bool,
    ) -> Result<RankedList<'a, T, W>>
    where
        T: AsRef<[u8]> + Sync,
        W: Weight,
    {
        if ranked.is_empty() {
            return Ok(RankedList::default());
        }
        let tasks = if sort { self.rank::<T, W>(&mut ranked, tasks)? } else { tasks };
        self.materialize(&ranked, items, tasks)
    }

    //--------------------------------------------------------------------------
    // batch calls

    /// Ranks the candidates matching `pattern`.
    ///
    /// Without `sort` the matches keep their input order. Batches are limited
    /// to `u32::MAX` candidates, larger ones fail with
    /// [`EngineError::TooManyCandidates`].
    pub fn match_all<'a, T>(
        &mut self,
        items: &'a [T],
        pattern: &Pattern,
        mode: MatchMode,
        sort: bool,
    ) -> Result<RankedList<'a, T, f32>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(RankedList::default());
        }
        let (ranked, plan) = self.score(items, BitMatcher::new(pattern, mode), None)?;
        self.ranked_list(ranked, items, plan.tasks, sort)
    }

    /// Like [`match_all`](Self::match_all), with input positions instead of references.
    ///
    /// Positions are `u32`, so at most `u32::MAX` candidates per batch.
    pub fn match_all_indexed<T>(
        &mut self,
        items: &[T],
        pattern: &Pattern,
        mode: MatchMode,
        sort: bool,
    ) -> Result<IndexedList<f32>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(IndexedList::default());
        }
        let (mut ranked, plan) = self.score(items, BitMatcher::new(pattern, mode), None)?;
        if ranked.is_empty() {
            return Ok(IndexedList::default());
        }
        let tasks = if sort {
            self.rank::<T, f32>(&mut ranked, plan.tasks)?
        } else {
            plan.tasks
        };
        self.materialize_indices::<T, f32>(&ranked, tasks)
    }

    /// Weights and input positions of the matching candidates, unsorted.
    pub fn match_all_raw<T>(&mut self, items: &[T], pattern: &Pattern, mode: MatchMode) -> Result<Vec<Ranked<f32>>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let (ranked, _) = self.score(items, BitMatcher::new(pattern, mode), None)?;
        Ok(ranked)
    }

    /// Like [`match_all`](Self::match_all), scoring only the part of each
    /// line that `category` keeps. The results reference whole lines.
    pub fn match_part<'a, T>(
        &mut self,
        items: &'a [T],
        pattern: &Pattern,
        category: &Category,
        mode: MatchMode,
        sort: bool,
    ) -> Result<RankedList<'a, T, f32>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(RankedList::default());
        }
        let (ranked, plan) = self.score(items, BitMatcher::new(pattern, mode), Some(category))?;
        self.ranked_list(ranked, items, plan.tasks, sort)
    }

    /// Ranks the candidates matching every whitespace separated word of
    /// `query`, weighted by the sum of the word weights.
    pub fn match_and<'a, T>(
        &mut self,
        items: &'a [T],
        query: &[u8],
        mode: MatchMode,
        sort: bool,
    ) -> Result<RankedList<'a, T, f32>>
    where
        T: AsRef<[u8]> + Sync,
    {
        let mut words = query
            .split(u8::is_ascii_whitespace)
            .filter(|word| !word.is_empty())
            .map(Pattern::new);
        let Some(first) = words.next() else {
            return self.match_all(items, &Pattern::new(""), mode, sort);
        };
        if items.is_empty() {
            return Ok(RankedList::default());
        }

        let (mut survivors, _) = self.score(items, BitMatcher::new(&first, mode), None)?;
        for pattern in words {
            if survivors.is_empty() {
                break;
            }
            let subset: Vec<&T> = survivors.iter().map(|r| &items[r.index as usize]).collect();
            let raw = self.match_all_raw(&subset, &pattern, mode)?;
            trace!("word narrowed {} candidates to {}", subset.len(), raw.len());
            // `raw` indexes `survivors`, in increasing order
            survivors = raw
                .iter()
                .map(|r| {
                    let prev = survivors[r.index as usize];
                    Ranked {
                        weight: prev.weight + r.weight,
                        index: prev.index,
                    }
                })
                .collect();
        }

        let tasks = ChunkPlan::new(survivors.len(), self.options.cpu_count).tasks;
        self.ranked_list(survivors, items, tasks, sort)
    }

    /// Highlight spans of each candidate, in input order.
    ///
    /// Every candidate must match `pattern`; the first one that does not is
    /// reported as [`EngineError::HighlightMismatch`].
    pub fn highlights<T>(&mut self, items: &[T], pattern: &Pattern, mode: MatchMode) -> Result<Vec<Highlights>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let plan = ChunkPlan::new(items.len(), self.options.cpu_count);
        debug!("highlighting {} candidates in {} chunks", items.len(), plan.tasks);

        let matcher = BitMatcher::new(pattern, mode);
        let mut spans = try_with_capacity(items.len())?;
        spans.resize(items.len(), None);
        let tasks: Vec<Task<'_, '_, T, f32>> = items
            .chunks(plan.chunk)
            .zip(spans.chunks_mut(plan.chunk))
            .map(|(items, out)| Task::Highlight { items, matcher, out })
            .collect();
        self.run_tasks(tasks)?;

        let mut highlights = try_with_capacity(items.len())?;
        for (index, spans) in spans.into_iter().enumerate() {
            highlights.push(spans.ok_or(EngineError::HighlightMismatch { index })?);
        }
        Ok(highlights)
    }

    /// Ranks every candidate path as a rename of `target`.
    ///
    /// The first `icon_prefix_len` bytes of each candidate are a decoration
    /// and are skipped. Nothing is filtered out; the target itself weighs 0.
    pub fn guess_best_rename<'a, T>(
        &mut self,
        items: &'a [T],
        target: &RenameTarget,
        icon_prefix_len: usize,
        sort: bool,
    ) -> Result<RankedList<'a, T, u32>>
    where
        T: AsRef<[u8]> + Sync,
    {
        if items.is_empty() {
            return Ok(RankedList::default());
        }
        check_candidate_count(items.len())?;
        let plan = ChunkPlan::new(items.len(), self.options.cpu_count);
        debug!("weighing {} paths in {} chunks", items.len(), plan.tasks);

        let mut ranked = try_with_capacity(items.len())?;
        ranked.resize(items.len(), Ranked { weight: 0, index: 0 });
        let tasks: Vec<Task<'_, '_, T, u32>> = items
            .chunks(plan.chunk)
            .zip(ranked.chunks_mut(plan.chunk))
            .enumerate()
            .map(|(i, (items, out))| Task::PathWeight {
                items,
                // below `items.len()`, which fits in u32
                base: (i * plan.chunk) as u32,
                target,
                icon_prefix_len,
                out,
            })
            .collect();
        self.run_tasks(tasks)?;

        self.ranked_list(ranked, items, plan.tasks, sort)
    }
}
