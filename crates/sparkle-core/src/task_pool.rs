//! Worker pool for offline and background work.
//!
//! The asset compiler decodes every source file on this pool, and runtime
//! payload preparation is offloaded here before the render thread uploads.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use async_executor::{Executor, Task};

/// A thread pool for executing async tasks.
///
/// # Example
///
/// ```ignore
/// use sparkle_core::TaskPool;
///
/// let pool = TaskPool::new(4);
/// let task = pool.spawn(async { 42 });
/// assert_eq!(pollster::block_on(task), 42);
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    threads: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskPool {
    /// Create a new task pool with the specified number of threads.
    ///
    /// # Panics
    ///
    /// Panics if num_threads is 0.
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "TaskPool must have at least one thread");

        let executor = Arc::new(Executor::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(num_threads);

        for i in 0..num_threads {
            let exec = executor.clone();
            let shutdown_flag = shutdown.clone();

            let handle = thread::Builder::new()
                .name(format!("sparkle-worker-{}", i))
                .spawn(move || {
                    while !shutdown_flag.load(Ordering::Relaxed) {
                        if !exec.try_tick() {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                })
                .expect("Failed to spawn task pool thread");

            threads.push(handle);
        }

        tracing::debug!("TaskPool created with {} threads", num_threads);

        Self {
            executor,
            threads,
            shutdown,
        }
    }

    /// Create a task pool using the number of available CPU cores.
    pub fn with_num_cpus() -> Self {
        Self::new(num_cpus::get())
    }

    /// Uses max(1, num_cpus - 1) to leave one core for the render thread.
    pub fn default_threads() -> Self {
        Self::new(Self::default_thread_count())
    }

    pub fn default_thread_count() -> usize {
        num_cpus::get().saturating_sub(1).max(1)
    }

    /// Spawn an async task on the pool.
    ///
    /// Dropping the returned `Task` cancels it.
    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Run a blocking closure on a worker.
    pub fn spawn_blocking<T, F>(&self, f: F) -> Task<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(async move { f() })
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Shutdown the task pool and wait for all threads to finish.
    ///
    /// Tasks still queued at this point are never polled.
    pub fn shutdown(mut self) {
        tracing::debug!("Shutting down TaskPool with {} threads", self.threads.len());

        self.shutdown.store(true, Ordering::Relaxed);

        let threads = std::mem::take(&mut self.threads);
        for handle in threads {
            if let Err(e) = handle.join() {
                tracing::error!("Task pool thread panicked: {:?}", e);
            }
        }

        tracing::debug!("TaskPool shutdown complete");
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_pool_creation() {
        let pool = TaskPool::new(2);
        assert_eq!(pool.thread_count(), 2);
    }

    #[test]
    fn test_spawn_and_await() {
        let pool = TaskPool::new(2);
        let task = pool.spawn(async { 42 });
        assert_eq!(pollster::block_on(task), 42);
    }

    #[test]
    fn test_spawn_blocking_preserves_order_of_results() {
        let pool = TaskPool::new(4);

        let tasks: Vec<_> = (0..10).map(|i| pool.spawn_blocking(move || i * 2)).collect();
        let results: Vec<_> = tasks.into_iter().map(pollster::block_on).collect();

        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
    }

    #[test]
    fn test_default_threads() {
        let pool = TaskPool::default_threads();
        assert!(pool.thread_count() >= 1);
        assert!(pool.thread_count() <= num_cpus::get());
    }

    #[test]
    #[should_panic(expected = "TaskPool must have at least one thread")]
    fn test_zero_threads_panics() {
        TaskPool::new(0);
    }

    #[test]
    fn test_shutdown() {
        let pool = TaskPool::new(2);
        let task = pool.spawn(async { 1 });
        assert_eq!(pollster::block_on(task), 1);
        pool.shutdown();
    }
}
