// src/engine/pool.rs
//
// Global thread pool for batch resizing. One pool per process, created lazily
// and sized from available parallelism; changes after initialization have no
// effect.

use crate::engine::{resize, ResizeRequest, ResizeResult};
use crate::error::Result;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::OnceLock;

/// Minimum number of worker threads when parallelism detection fails.
const MIN_THREADS: usize = 1;

static GLOBAL_THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

pub(crate) fn get_pool() -> &'static ThreadPool {
    GLOBAL_THREAD_POOL.get_or_init(|| {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_THREADS);

        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap_or_else(|_| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(MIN_THREADS)
                    .build()
                    .expect("failed to create fallback thread pool")
            })
    })
}

/// Run independent requests in parallel on the shared pool. Results come back
/// in request order; each request succeeds or fails on its own.
pub fn resize_batch(requests: Vec<ResizeRequest>) -> Vec<Result<ResizeResult>> {
    get_pool().install(|| requests.into_par_iter().map(resize).collect())
}
