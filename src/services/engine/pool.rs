// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded-concurrency admission gate.
///
/// At most `concurrency` admitted futures run at once; callers beyond the
/// limit suspend and are admitted in FIFO order as slots free up. The wait
/// queue is unbounded; callers needing backpressure must reject upstream.
/// The slot is released when the future completes, errors, or panics (permit
/// drop), so a failing task can never wedge the pool.
#[derive(Clone)]
pub struct ExecutionPool {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl ExecutionPool {
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Free slots right now; informational only.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run `fut` once a slot is available. The output (including errors)
    /// passes through unchanged.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore closed");
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        let pool = ExecutionPool::new(3);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let pool = pool.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.run(async {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.available(), 3);
    }

    #[tokio::test]
    async fn slot_released_on_error() {
        let pool = ExecutionPool::new(1);
        let out: Result<(), &str> = pool.run(async { Err("boom") }).await;
        assert_eq!(out.unwrap_err(), "boom");
        // next admission proceeds immediately
        let ok: u32 = pool.run(async { 7 }).await;
        assert_eq!(ok, 7);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn five_tasks_two_slots_take_three_waves() {
        let pool = ExecutionPool::new(2);
        let start = tokio::time::Instant::now();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                // the timer must start at admission, not at submission
                pool.run(async { sleep(Duration::from_millis(50)).await }).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let elapsed = start.elapsed();
        // ceil(5/2) waves of 50ms
        assert!(elapsed >= Duration::from_millis(150), "too fast: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "too slow: {elapsed:?}");
    }

    #[tokio::test]
    async fn queued_tasks_start_only_after_a_slot_frees() {
        let pool = ExecutionPool::new(2);
        let completions = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            let completions = completions.clone();
            handles.push(tokio::spawn(async move {
                pool.run(async {
                    let done_before = completions.load(Ordering::SeqCst);
                    sleep(Duration::from_millis(50)).await;
                    completions.fetch_add(1, Ordering::SeqCst);
                    done_before
                })
                .await
            }));
        }
        let mut done_before_start = Vec::new();
        for h in handles {
            done_before_start.push(h.await.unwrap());
        }
        // the first two admissions saw zero completions; every later one saw
        // at least one task finish before it started
        let zero_starts = done_before_start.iter().filter(|&&d| d == 0).count();
        assert_eq!(zero_starts, 2);
    }
}
