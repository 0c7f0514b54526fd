use tokio::task::JoinHandle;
use trendlens_core::CategoryKey;

/// Handle to a running category watch.
///
/// Dropping the handle stops delivery and releases the backend watch.
/// [`Subscription::unsubscribe`] does the same but also waits until the
/// watch task is gone.
#[derive(Debug)]
pub struct Subscription {
    category: CategoryKey,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(category: CategoryKey, task: JoinHandle<()>) -> Self {
        Self {
            category,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn category(&self) -> CategoryKey {
        self.category
    }

    /// `false` once the watch task has exited.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // A cancelled join error is the expected outcome.
            let _ = task.await;
        }
        tracing::debug!(category = %self.category, "unsubscribed from category");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
