//! Tracked background work that outlives the request that started it.
//!
//! Analytics hits are sent after the client already has its response. Tasks
//! are registered here instead of being detached, so shutdown can wait for
//! them (up to a deadline) rather than dropping them mid-flight.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinSet;

/// Shared set of in-flight background tasks.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Finished tasks are reaped on the way in.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.inner.lock().expect("background task mutex poisoned");
        while let Some(finished) = set.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!(error = %e, "Background task failed");
            }
        }
        set.spawn(task);
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("background task mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for all registered tasks, aborting whatever is left after `deadline`.
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn drain(&self, deadline: Duration) -> usize {
        let mut set = std::mem::take(&mut *self.inner.lock().expect("background task mutex poisoned"));
        if set.is_empty() {
            return 0;
        }

        tracing::info!(pending = set.len(), "Draining background tasks");

        let finished = tokio::time::timeout(deadline, async {
            while let Some(result) = set.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Background task failed");
                }
            }
        })
        .await;

        if finished.is_ok() {
            return 0;
        }

        let abandoned = set.len();
        tracing::warn!(abandoned, "Background tasks did not finish before deadline");
        set.shutdown().await;
        abandoned
    }
}
