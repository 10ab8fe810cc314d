use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::error;

/// Counts tasks that have been enqueued but not yet fully processed.
///
/// Workers call [`task_added`](Self::task_added) for every child before
/// enqueueing it and before calling [`task_done`](Self::task_done) for the
/// task that produced it, so the count cannot touch zero while work remains.
#[derive(Debug, Default)]
pub struct TaskTracker {
    outstanding: AtomicUsize,
    added: AtomicUsize,
    completed: AtomicUsize,
    idle: Notify,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_added(&self) {
        self.added.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one task complete. A call with nothing outstanding is a protocol
    /// bug; it is logged and the counter stays at zero.
    pub fn task_done(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
                // notify_one keeps a permit if the observer is not waiting yet
                self.idle.notify_one();
            }
            Ok(_) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) => {
                error!("task_done called with no outstanding tasks");
            }
        }
    }

    /// Guard that calls [`task_done`](Self::task_done) when dropped, so a
    /// received task is completed exactly once on every path out of the
    /// worker loop body, including early `continue`s and panics.
    pub fn complete_on_drop(&self) -> TaskCompletion<'_> {
        TaskCompletion { tracker: self }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Resolves once the outstanding count reads zero.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[must_use = "the task completes as soon as the guard is dropped"]
pub struct TaskCompletion<'a> {
    tracker: &'a TaskTracker,
}

impl Drop for TaskCompletion<'_> {
    fn drop(&mut self) {
        self.tracker.task_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_counts_balance() {
        let tracker = TaskTracker::new();
        tracker.task_added();
        tracker.task_added();
        assert_eq!(tracker.outstanding(), 2);

        tracker.task_done();
        tracker.task_done();
        assert_eq!(tracker.outstanding(), 0);
        assert_eq!(tracker.added(), 2);
        assert_eq!(tracker.completed(), 2);
    }

    #[test]
    fn test_never_goes_negative() {
        let tracker = TaskTracker::new();
        tracker.task_done();
        assert_eq!(tracker.outstanding(), 0);
        assert_eq!(tracker.completed(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_empty() {
        let tracker = TaskTracker::new();
        tokio::time::timeout(Duration::from_millis(100), tracker.wait_idle())
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_zero() {
        let tracker = Arc::new(TaskTracker::new());
        tracker.task_added();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Child counted before the parent completes keeps the tracker busy.
        tracker.task_added();
        tracker.task_done();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        tracker.task_done();
        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("observer should wake")
            .unwrap();
    }

    #[test]
    fn test_completion_guard_completes_once() {
        let tracker = TaskTracker::new();
        tracker.task_added();
        tracker.task_added();
        {
            let _done = tracker.complete_on_drop();
            assert_eq!(tracker.outstanding(), 2);
        }
        assert_eq!(tracker.outstanding(), 1);
        assert_eq!(tracker.completed(), 1);
    }

    #[tokio::test]
    async fn test_zero_reached_before_waiting() {
        let tracker = TaskTracker::new();
        tracker.task_added();
        tracker.task_done();
        tokio::time::timeout(Duration::from_millis(100), tracker.wait_idle())
            .await
            .expect("should not block");
    }
}
