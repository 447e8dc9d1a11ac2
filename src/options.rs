//! Configuration of the batch engine.
//!
//! [`EngineOptions`] holds the worker count and the thresholds that decide
//! when sorting and result materialization are split across the pool. The
//! defaults are tuned for interactive filtering of a few hundred thousand
//! lines.

use std::num::NonZeroUsize;
use std::thread;

use derive_builder::Builder;

/// Number of hardware threads, 1 if it cannot be determined
pub fn default_cpu_count() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Options of a [`FuzzyEngine`](crate::FuzzyEngine)
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(build_fn(name = "final_build"))]
#[builder(default)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct EngineOptions {
    /// Number of worker threads
    ///
    /// With a single thread every call runs on the caller's thread.
    #[cfg_attr(
        feature = "cli",
        arg(long = "threads", short = 't', default_value_t = default_cpu_count(), help_heading = "Engine")
    )]
    pub cpu_count: usize,

    /// Below this many matches the results are sorted on one thread
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 60_000, help_heading = "Engine"))]
    pub sort_parallel_threshold: usize,

    /// Below this many matches the output lists are built on one thread
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 40_000, help_heading = "Engine"))]
    pub materialize_parallel_threshold: usize,

    /// Smallest chunk handed to a parallel sort task
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 2_000, help_heading = "Engine"))]
    pub sort_chunk_floor: usize,

    /// Smallest chunk handed to a parallel materialization task
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 8_000, help_heading = "Engine"))]
    pub materialize_chunk_floor: usize,

    /// Name prefix of the worker threads, followed by the worker number
    #[cfg_attr(feature = "cli", arg(skip = String::from("bitfuzz-worker")))]
    pub thread_name_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cpu_count: default_cpu_count(),
            sort_parallel_threshold: 60_000,
            materialize_parallel_threshold: 40_000,
            sort_chunk_floor: 2_000,
            materialize_chunk_floor: 8_000,
            thread_name_prefix: String::from("bitfuzz-worker"),
        }
    }
}

impl EngineOptionsBuilder {
    /// Builds the EngineOptions from the builder
    pub fn build(&mut self) -> Result<EngineOptions, EngineOptionsBuilderError> {
        self.final_build().map(|opts| opts.build())
    }
}

impl EngineOptions {
    /// Finalizes the options, clamping values the engine cannot work with
    pub fn build(mut self) -> Self {
        if self.cpu_count == 0 {
            warn!("cpu_count of 0 requested, using a single thread");
            self.cpu_count = 1;
        }
        self.sort_chunk_floor = self.sort_chunk_floor.max(1);
        self.materialize_chunk_floor = self.materialize_chunk_floor.max(1);
        self
    }

    /// Options with `cpu_count` workers and default thresholds
    pub fn with_cpu_count(cpu_count: usize) -> Self {
        Self {
            cpu_count,
            ..Default::default()
        }
        .build()
    }
}
