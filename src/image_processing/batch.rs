use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Run `process_fn` over `files` on a pool of `jobs` workers.
///
/// Results come back in input order whatever the completion order was, and
/// an `Err` from one file never stops the others. `on_done` runs on the
/// worker right after each file finishes.
pub fn process_files_parallel<T, F, P>(
    files: &[PathBuf],
    jobs: usize,
    process_fn: F,
    on_done: P,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&PathBuf) -> T + Send + Sync,
    P: Fn(&T, usize) + Send + Sync,
{
    let completed = AtomicUsize::new(0);
    let next = || completed.fetch_add(1, Ordering::Relaxed) + 1;

    if jobs <= 1 {
        return Ok(files
            .iter()
            .map(|file| {
                let result = process_fn(file);
                on_done(&result, next());
                result
            })
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to initialize thread pool")?;

    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let result = process_fn(file);
                on_done(&result, next());
                result
            })
            .collect()
    }))
}

/// Counts reported at the end of a directory run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl BatchSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn average_duration(&self) -> Duration {
        if self.total_files == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.total_files as u32
        }
    }
}
