//! Task queue and worker pool.
//!
//! The pool is a fixed set of named rayon threads. For every batch the driver
//! opens a bounded queue, starts one consumer loop per thread inside a rayon
//! scope, feeds the queue its jobs and then one `None` sentinel per consumer.
//! Leaving the scope is the join barrier: it only returns once every job has
//! run, which is what lets jobs borrow from the driver's stack.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use kanal::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{EngineError, Result};

/// Queue slots per worker: the chunking never submits more than 8 tasks per
/// worker at once, one more slot per worker holds its sentinel.
const SLOTS_PER_WORKER: usize = 9;

fn worker_loop<J: FnOnce()>(queue: &Receiver<Option<J>>, panicked: &AtomicBool) {
    // a closed queue without sentinels means the driver is unwinding
    while let Ok(Some(job)) = queue.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            panicked.store(true, Ordering::Relaxed);
        }
    }
}

/// Fixed set of named worker threads consuming one bounded queue per batch
pub(crate) struct WorkerPool {
    threads: ThreadPool,
    capacity: usize,
}

impl WorkerPool {
    /// Starts `cpu_count` workers named `{prefix}-{id}`.
    pub fn new(cpu_count: usize, prefix: &str) -> Result<Self> {
        let cpu_count = cpu_count.max(1);
        let prefix = prefix.to_owned();
        let threads = ThreadPoolBuilder::new()
            .num_threads(cpu_count)
            .thread_name(move |id| format!("{prefix}-{id}"))
            .build()?;
        debug!("started {cpu_count} workers");
        Ok(Self {
            threads,
            capacity: SLOTS_PER_WORKER * cpu_count + 1,
        })
    }

    /// Runs every job on the workers and waits for all of them.
    ///
    /// Submission blocks while the queue is full. Returns
    /// [`EngineError::TaskPanicked`] if a job panicked; the remaining jobs
    /// still ran to completion.
    pub fn run<I, J>(&self, jobs: I) -> Result<()>
    where
        I: IntoIterator<Item = J>,
        J: FnOnce() + Send,
    {
        let workers = self.threads.current_num_threads();
        let panicked = AtomicBool::new(false);
        let (queue, consumer): (Sender<Option<J>>, Receiver<Option<J>>) = kanal::bounded(self.capacity);

        let panicked_ref = &panicked;
        // the driver stays on the calling thread, so every worker is free to
        // consume; the queue moves in so that an unwinding driver closes it
        self.threads.in_place_scope(move |scope| {
            for _ in 0..workers {
                let consumer = consumer.clone();
                let panicked = panicked_ref;
                scope.spawn(move |_| worker_loop(&consumer, panicked));
            }
            drop(consumer);

            let mut submitted = 0usize;
            for job in jobs {
                if queue.send(Some(job)).is_err() {
                    break;
                }
                submitted += 1;
            }
            for _ in 0..workers {
                if queue.send(None).is_err() {
                    break;
                }
            }
            trace!("submitted {submitted} jobs to {workers} workers");
        });

        if panicked.into_inner() {
            return Err(EngineError::TaskPanicked);
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        debug!("worker pool shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn runs_every_job() {
        let pool = WorkerPool::new(4, "test-worker").unwrap();
        let count = AtomicUsize::new(0);
        let count = &count;
        for _ in 0..3 {
            pool.run((0..32).map(move |_| {
                move || {
                    count.fetch_add(1, Ordering::Relaxed);
                }
            }))
            .unwrap();
        }
        assert_eq!(count.load(Ordering::Relaxed), 96);
    }

    #[test]
    fn more_jobs_than_queue_slots() {
        let pool = WorkerPool::new(2, "test-worker").unwrap();
        assert!(pool.capacity < 1000);
        let count = AtomicUsize::new(0);
        let count = &count;
        pool.run((0..1000).map(move |_| {
            move || {
                count.fetch_add(1, Ordering::Relaxed);
            }
        }))
        .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn jobs_write_disjoint_borrowed_slices() {
        let pool = WorkerPool::new(3, "test-worker").unwrap();
        let mut out = vec![0usize; 1000];
        pool.run(out.chunks_mut(64).enumerate().map(|(i, chunk)| {
            move || {
                for (j, slot) in chunk.iter_mut().enumerate() {
                    *slot = i * 64 + j;
                }
            }
        }))
        .unwrap();
        assert!(out.iter().enumerate().all(|(i, &v)| i == v));
    }

    #[test]
    fn workers_are_named() {
        let pool = WorkerPool::new(2, "named").unwrap();
        let names = Mutex::new(Vec::new());
        let names_ref = &names;
        pool.run((0..8).map(move |_| {
            move || {
                let name = thread::current().name().map(String::from);
                names_ref.lock().unwrap().push(name);
            }
        }))
        .unwrap();
        let names = names.into_inner().unwrap();
        assert_eq!(names.len(), 8);
        for name in names {
            assert!(name.unwrap().starts_with("named-"));
        }
    }

    #[test]
    fn panicking_job_is_reported_and_pool_survives() {
        let pool = WorkerPool::new(2, "test-worker").unwrap();
        let count = AtomicUsize::new(0);
        let count_ref = &count;
        let result = pool.run((0..11).map(move |i| {
            move || {
                if i == 0 {
                    panic!("boom");
                }
                count_ref.fetch_add(1, Ordering::Relaxed);
            }
        }));
        assert!(matches!(result, Err(EngineError::TaskPanicked)));
        assert_eq!(count.load(Ordering::Relaxed), 10);

        let again = pool.run(std::iter::once(|| {}));
        assert!(again.is_ok());
    }
}
