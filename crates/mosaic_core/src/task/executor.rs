//! Serial and thread-pooled plan execution.

use std::fmt;
use std::sync::Arc;

use rayon::iter::{IntoParallelRefMutIterator as _, ParallelIterator as _};

use crate::error::MosaicResult;

/// Decides where plan work runs.
#[derive(Clone, Default)]
pub enum Executor {
    /// Everything runs on the calling thread, in order.
    #[default]
    Serial,
    /// Per-item work is spread over a worker pool.
    Parallel(Arc<rayon::ThreadPool>),
}

impl Executor {
    /// Creates a parallel executor backed by a dedicated pool.
    ///
    /// `threads == 0` lets rayon pick one thread per core.
    pub fn parallel(threads: usize) -> MosaicResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mosaic-worker-{i}"))
            .build()?;
        Ok(Self::Parallel(Arc::new(pool)))
    }

    /// Number of threads work may be spread over.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Parallel(pool) => pool.current_num_threads(),
        }
    }

    /// Applies `f` to every item. Items are disjoint, so this is safe to
    /// split across threads.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Send + Sync,
    {
        match self {
            Self::Serial => items.iter_mut().for_each(f),
            Self::Parallel(pool) => pool.install(|| items.par_iter_mut().for_each(f)),
        }
    }

    /// Runs both closures; concurrently when parallel.
    pub fn join<A, B>(&self, a: A, b: B)
    where
        A: FnOnce() + Send,
        B: FnOnce() + Send,
    {
        match self {
            Self::Serial => {
                a();
                b();
            }
            Self::Parallel(pool) => {
                pool.join(a, b);
            }
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => f.write_str("Serial"),
            Self::Parallel(pool) => f
                .debug_struct("Parallel")
                .field("threads", &pool.current_num_threads())
                .finish(),
        }
    }
}
