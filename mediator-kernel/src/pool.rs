//! Bounded execution pool for dispatched requests.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

/// Concurrency limit applied to handler execution.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    max_concurrency: NonZeroUsize,
}

impl PoolConfig {
    /// Creates a configuration with the supplied concurrency limit.
    #[must_use]
    pub const fn new(max_concurrency: NonZeroUsize) -> Self {
        Self { max_concurrency }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn max_concurrency(self) -> NonZeroUsize {
        self.max_concurrency
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(32).expect("non-zero"))
    }
}

/// Bounds how many dispatched requests run at once.
///
/// A submission waits for a permit before its task is spawned, so the
/// caller's dispatch future queues while the pool is saturated. The
/// permit travels with the task and is released on completion. A nested
/// dispatch submits through the same pool while its parent still holds a
/// permit, so the limit must cover expected recursion depth times
/// concurrent load.
#[derive(Debug, Clone)]
pub struct DispatchPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    closed: Arc<AtomicBool>,
}

impl DispatchPool {
    /// Constructs a pool using the provided configuration.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let capacity = config.max_concurrency().get();
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many permits are currently free.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Returns `true` if the pool has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the pool. Queued submissions that have not yet obtained a
    /// permit fail with [`DispatchError::PoolClosed`]; tasks already
    /// running keep their permits and run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.permits.close();
    }

    /// Waits for a permit, then spawns the future as its own task.
    ///
    /// The label names the work (the tool being dispatched) in queue
    /// logging.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolClosed`] when the pool is closed,
    /// whether before submission or while the submission is queued.
    pub async fn spawn<F, T>(&self, label: &str, future: F) -> DispatchResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(DispatchError::PoolClosed);
        }

        if self.available_permits() == 0 {
            debug!(%label, capacity = self.capacity, "dispatch pool saturated, queueing");
        }
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_closed| DispatchError::PoolClosed)?;

        Ok(tokio::spawn(async move {
            let output = future.await;
            drop(permit);
            output
        }))
    }
}

impl Default for DispatchPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    fn pool_of(capacity: usize) -> DispatchPool {
        DispatchPool::new(PoolConfig::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[tokio::test]
    async fn saturated_pool_queues_submissions() {
        let pool = pool_of(1);
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let holder = pool
            .spawn("holder", async move {
                release_rx.await.ok();
            })
            .await
            .unwrap();
        assert_eq!(pool.available_permits(), 0);

        let queued = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.spawn("queued", async {}).await })
        };
        tokio::task::yield_now().await;
        assert!(!queued.is_finished());

        release_tx.send(()).unwrap();
        holder.await.unwrap();
        queued.await.unwrap().unwrap().await.unwrap();
        assert_eq!(pool.available_permits(), 1);
    }

    #[tokio::test]
    async fn nested_submission_holds_a_second_permit() {
        let pool = pool_of(2);
        let inner_pool = pool.clone();
        let observer_pool = pool.clone();

        let outer = pool
            .spawn("outer", async move {
                let inner = inner_pool
                    .spawn("inner", async move { observer_pool.available_permits() })
                    .await
                    .unwrap();
                inner.await.unwrap()
            })
            .await
            .unwrap();

        // Both the outer and the nested task held permits concurrently.
        assert_eq!(outer.await.unwrap(), 0);
        assert_eq!(pool.available_permits(), 2);
    }

    #[tokio::test]
    async fn close_rejects_new_submissions() {
        let pool = DispatchPool::default();
        pool.close();

        let err = pool.spawn("late", async {}).await.unwrap_err();
        assert!(matches!(err, DispatchError::PoolClosed));
    }

    #[tokio::test]
    async fn close_fails_queued_submissions_without_stopping_running_work() {
        let pool = pool_of(1);
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let holder = pool
            .spawn("holder", async move { release_rx.await.is_ok() })
            .await
            .unwrap();

        let queued = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.spawn("queued", async {}).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        pool.close();
        let err = queued.await.unwrap().unwrap_err();
        assert!(matches!(err, DispatchError::PoolClosed));

        release_tx.send(()).unwrap();
        assert!(holder.await.unwrap());
    }
}
