//! # Threading Module
//!
//! Task-lifecycle and bounded-concurrency helpers for the orchestration
//! layer.
//!
//! ## Overview
//!
//! * [`TaskManager`] owns the background tasks of a component and can wait
//!   for or abort all of them at shutdown
//! * [`run_concurrent_batch`] fans a job over a collection with a cap on
//!   how many run at once

use futures::{StreamExt, stream};
use std::future::Future;
use tokio::task::JoinHandle;

/// Owns a set of spawned tasks for collective shutdown.
///
/// # Examples
///
/// ```
/// use proxyforge::orchestration::threading::TaskManager;
///
/// #[tokio::main]
/// async fn main() {
///     let mut tasks = TaskManager::new();
///     tasks.spawn(async { /* background work */ });
///     tasks.cancel_all();
/// }
/// ```
#[derive(Default)]
pub struct TaskManager {
    tasks: Vec<JoinHandle<()>>,
}

impl TaskManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a task onto the runtime and tracks its handle.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(future));
    }

    /// Waits for every tracked task to finish.
    pub async fn join_all(&mut self) {
        while let Some(task) = self.tasks.pop() {
            let _ = task.await;
        }
    }

    /// Aborts every tracked task.
    ///
    /// In-flight I/O inside the tasks is dropped; nothing observes the
    /// cancellation beyond the tasks themselves.
    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Runs a job over every item with at most `concurrency` in flight.
///
/// Results arrive in completion order, not input order; callers that care
/// about order must carry a key through the job.
///
/// # Examples
///
/// ```
/// use proxyforge::orchestration::threading::run_concurrent_batch;
///
/// #[tokio::main]
/// async fn main() {
///     let doubled = run_concurrent_batch(vec![1, 2, 3], 2, |n| async move { n * 2 }).await;
///     assert_eq!(doubled.iter().sum::<i32>(), 12);
/// }
/// ```
pub async fn run_concurrent_batch<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    job_fn: F,
) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send,
{
    stream::iter(items)
        .map(|item| job_fn(item))
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
}
