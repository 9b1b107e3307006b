//! Admission control for asynchronous jobs.
//!
//! An [`AdmissionPool`] lets at most `capacity` jobs execute at the same
//! time. Jobs submitted while the pool is saturated wait in a
//! [`PriorityQueue`] and are released one at a time, highest weight first,
//! whenever a running job finishes.

use crate::queue::PriorityQueue;
use crate::timed::Timed;
use futures::channel::oneshot;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Number of jobs allowed to run concurrently unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 100;

/// Timing information reported for every job that passes through the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobAnalytics {
    /// Time between the job being admitted and it completing.
    pub execution_time: Duration,
    /// Time spent waiting for admission.
    pub time_in_queue: Duration,
    /// Share of the job's total lifetime spent waiting (`0.0..=1.0`).
    pub waiting_ratio: f64,
}
impl JobAnalytics {
    pub fn new(execution_time: Duration, time_in_queue: Duration) -> Self {
        let total = (execution_time + time_in_queue).as_secs_f64();
        let waiting_ratio = if total > 0.0 { time_in_queue.as_secs_f64() / total } else { 0.0 };
        Self { execution_time, time_in_queue, waiting_ratio }
    }
}

/// Receives [`JobAnalytics`] for observability purposes.
///
/// Sinks are advisory: nothing they do feeds back into scheduling.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, weight: f64, analytics: &JobAnalytics);
}

/// Default sink; emits a TRACE event per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;
impl AnalyticsSink for TracingSink {
    fn record(&self, weight: f64, analytics: &JobAnalytics) {
        tracing::trace!(
            weight,
            execution_ms = analytics.execution_time.as_millis() as u64,
            queued_ms = analytics.time_in_queue.as_millis() as u64,
            waiting_ratio = analytics.waiting_ratio,
            "Pool job finished"
        );
    }
}

/// Snapshot of the pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub running: usize,
    pub pending: usize,
}

/// Bounds the number of concurrently executing jobs.
///
/// The pool is a cheap handle (an [`Arc`] internally): clone it to share one
/// set of capacity between callers, or construct another pool for
/// independent state. There is no global instance.
///
/// Equal-weight waiters are released in submission order, courtesy of the
/// [`PriorityQueue`] tie-break.
///
/// # Examples
///
/// ```
/// use backcheck_asyncutils::AdmissionPool;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = AdmissionPool::new(2);
/// let answer = pool.submit(1024.0, async { 6 * 7 }).await;
/// assert_eq!(answer, 42);
/// assert_eq!(pool.stats().running, 0);
/// # }
/// ```
#[derive(Clone)]
pub struct AdmissionPool {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    state: Mutex<State>,
    sink: Arc<dyn AnalyticsSink>,
}

struct State {
    running: usize,
    waiting: PriorityQueue<oneshot::Sender<()>>,
}

impl fmt::Debug for AdmissionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPool")
            .field("capacity", &self.inner.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for AdmissionPool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AdmissionPool {
    /// Create a pool reporting analytics through [`TracingSink`].
    ///
    /// A capacity of zero would never admit anything, so it is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_sink(capacity, Arc::new(TracingSink))
    }

    pub fn with_sink(capacity: usize, sink: Arc<dyn AnalyticsSink>) -> Self {
        let state = State { running: 0, waiting: PriorityQueue::new() };
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                state: Mutex::new(state),
                sink,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats { running: state.running, pending: state.waiting.len() }
    }

    /// Run `job` once the pool admits it.
    ///
    /// The job's output is returned as-is: a job resolving to an `Err`
    /// releases its slot exactly like a successful one.
    pub async fn submit<F: Future>(&self, weight: f64, job: F) -> F::Output {
        self.submit_timed(weight, job).await.0
    }

    /// Like [`submit`](Self::submit), also returning the job's [`JobAnalytics`].
    pub async fn submit_timed<F: Future>(&self, weight: f64, job: F) -> (F::Output, JobAnalytics) {
        let queued_at = Instant::now();
        let permit = self.acquire(weight).await;
        let time_in_queue = queued_at.elapsed();
        let (output, execution_time) = Timed::new(job).await;
        drop(permit);
        let analytics = JobAnalytics::new(execution_time, time_in_queue);
        self.inner.sink.record(weight, &analytics);
        (output, analytics)
    }

    async fn acquire(&self, weight: f64) -> Permit {
        loop {
            let receiver = {
                let mut state = self.inner.lock();
                if state.running < self.inner.capacity {
                    state.running += 1;
                    return Permit { inner: Arc::clone(&self.inner) };
                }
                let (sender, receiver) = oneshot::channel();
                state.waiting.insert(weight, sender);
                receiver
            };
            let mut waiter = Waiter { receiver, inner: Arc::clone(&self.inner), admitted: false };
            if (&mut waiter.receiver).await.is_ok() {
                waiter.admitted = true;
                return Permit { inner: Arc::clone(&self.inner) };
            }
            // Sender discarded without handing over a slot: queue up again.
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // The state is a counter and a heap; neither is left half-updated by
        // a panic elsewhere, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the caller's slot to the heaviest live waiter, or give it back.
    fn release(&self) {
        let mut state = self.lock();
        while let Some(next) = state.waiting.extract_max() {
            if next.send(()).is_ok() {
                return;
            }
        }
        state.running = state.running.saturating_sub(1);
    }
}

/// One unit of capacity. Released on drop, whatever the job's outcome.
struct Permit {
    inner: Arc<Inner>,
}
impl Drop for Permit {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// A queued submission. If it is dropped after being handed a slot but
/// before turning it into a [`Permit`], the slot is passed on.
struct Waiter {
    receiver: oneshot::Receiver<()>,
    inner: Arc<Inner>,
    admitted: bool,
}
impl Drop for Waiter {
    fn drop(&mut self) {
        if self.admitted {
            return;
        }
        self.receiver.close();
        if let Ok(Some(())) = self.receiver.try_recv() {
            self.inner.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..10_000 {
            if condition() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition never became true");
    }

    fn pool_should_explode() -> bool {
        true
    }

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<(f64, JobAnalytics)>>);
    impl AnalyticsSink for CollectingSink {
        fn record(&self, weight: f64, analytics: &JobAnalytics) {
            self.0.lock().unwrap().push((weight, *analytics));
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let pool = AdmissionPool::new(3);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let jobs = (0..25).map(|i| {
            pool.submit(i as f64, async {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(1)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
        });
        futures::future::join_all(jobs).await;
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(pool.stats(), PoolStats { running: 0, pending: 0 });
    }

    #[tokio::test]
    async fn test_releases_highest_weight_first() {
        let pool = AdmissionPool::new(1);
        let (gate, gate_rx) = oneshot::channel::<()>();
        let blocker = tokio::spawn({
            let pool = pool.clone();
            async move {
                pool.submit(1.0, async move {
                    let _ = gate_rx.await;
                })
                .await
            }
        });
        wait_until(|| pool.stats().running == 1).await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for (queued, weight) in [10.0, 1000.0, 50.0].into_iter().enumerate() {
            let job_pool = pool.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                job_pool.submit(weight, async move { order.lock().unwrap().push(weight) }).await
            }));
            wait_until(|| pool.stats().pending == queued + 1).await;
        }

        gate.send(()).unwrap();
        blocker.await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![1000.0, 50.0, 10.0]);
    }

    #[tokio::test]
    async fn test_failures_release_capacity() {
        let pool = AdmissionPool::new(1);
        let jobs = (0..10).map(|i| pool.submit(1.0, async move { Err::<(), _>(format!("job {i} failed")) }));
        let results = futures::future::join_all(jobs).await;
        assert!(results.iter().all(Result::is_err));
        assert_eq!(pool.stats(), PoolStats { running: 0, pending: 0 });
        assert_eq!(pool.submit(1.0, async { "still admits" }).await, "still admits");
    }

    #[tokio::test]
    async fn test_panicking_job_releases_capacity() {
        let pool = AdmissionPool::new(1);
        let handle = tokio::spawn({
            let pool = pool.clone();
            async move {
                pool.submit(1.0, async {
                    if pool_should_explode() {
                        panic!("job exploded");
                    }
                })
                .await
            }
        });
        assert!(handle.await.is_err());
        assert_eq!(pool.stats().running, 0);
    }

    #[tokio::test]
    async fn test_dropped_waiter_leaves_the_queue() {
        let pool = AdmissionPool::new(1);
        let (gate, gate_rx) = oneshot::channel::<()>();
        let blocker = tokio::spawn({
            let pool = pool.clone();
            async move { pool.submit(1.0, async move { drop(gate_rx.await) }).await }
        });
        wait_until(|| pool.stats().running == 1).await;
        let waiter = tokio::spawn({
            let pool = pool.clone();
            async move { pool.submit(99.0, async {}).await }
        });
        wait_until(|| pool.stats().pending == 1).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        gate.send(()).unwrap();
        blocker.await.unwrap();
        assert_eq!(pool.stats(), PoolStats { running: 0, pending: 0 });
        assert_eq!(pool.submit(1.0, async { 7 }).await, 7);
    }

    #[tokio::test]
    async fn test_reports_analytics_for_every_job() {
        let sink = Arc::new(CollectingSink::default());
        let pool = AdmissionPool::with_sink(2, sink.clone());
        let jobs = [100.0, 200.0, 300.0].map(|weight| pool.submit(weight, async {}));
        futures::future::join_all(jobs).await;
        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        let mut weights: Vec<_> = recorded.iter().map(|(weight, _)| *weight).collect();
        weights.sort_by(f64::total_cmp);
        assert_eq!(weights, vec![100.0, 200.0, 300.0]);
        assert!(recorded.iter().all(|(_, a)| (0.0..=1.0).contains(&a.waiting_ratio)));
    }

    #[test]
    fn test_waiting_ratio() {
        let analytics = JobAnalytics::new(Duration::from_millis(300), Duration::from_millis(100));
        assert!((analytics.waiting_ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(JobAnalytics::new(Duration::ZERO, Duration::ZERO).waiting_ratio, 0.0);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(AdmissionPool::new(0).capacity(), 1);
        assert_eq!(AdmissionPool::default().capacity(), DEFAULT_CAPACITY);
    }
}
