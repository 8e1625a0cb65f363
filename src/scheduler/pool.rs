//! Bounded-queue worker pool for placement evaluation.
//!
//! Per-level enumeration is embarrassingly parallel: every (permutation,
//! assignment, scaling) tuple is evaluated against a read-only snapshot
//! of the pre-level timeline and either returns a finished timeline or a
//! prune signal. Jobs flow through a bounded channel so the generator
//! never materializes the whole Cartesian product ahead of the workers;
//! results are merged serially by the driver.
//!
//! The optional wall-clock deadline stops dispatch: jobs already queued
//! drain, no new ones are submitted.

use std::time::Instant;

use crossbeam_channel::{bounded, unbounded};
use tracing::debug;

/// Runs `handler` over `jobs` on `workers` threads, returning the results
/// in completion order. Dispatch stops once `deadline` passes.
pub(crate) fn run_tasks<J, R, F>(
    workers: usize,
    jobs: impl Iterator<Item = J>,
    handler: F,
    deadline: Option<Instant>,
) -> Vec<R>
where
    J: Send,
    R: Send,
    F: Fn(J) -> R + Sync,
{
    let workers = workers.max(1);
    let (job_tx, job_rx) = bounded::<J>(workers * 2);
    let (result_tx, result_rx) = unbounded::<R>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let handler = &handler;
            scope.spawn(move || {
                for job in job_rx.iter() {
                    if result_tx.send(handler(job)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        let mut dispatched = 0usize;
        for job in jobs {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(dispatched, "search timeout reached, draining in-flight work");
                break;
            }
            if job_tx.send(job).is_err() {
                break;
            }
            dispatched += 1;
        }
        drop(job_tx);

        result_rx.iter().collect()
    })
}
