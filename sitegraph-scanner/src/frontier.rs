use crate::error::{Result, ScanError};
use flume::{Receiver, Sender};
use parking_lot::Mutex;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Bounded FIFO of pending URLs shared by every worker, which are both its
/// producers and its consumers.
///
/// Closing drops the only long-lived sender; receivers then drain what is left
/// and observe the end of the queue.
#[derive(Debug)]
pub struct Frontier {
    tx: Mutex<Option<Sender<String>>>,
    rx: Receiver<String>,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Enqueues `url`, waiting while the queue is at capacity.
    pub async fn push(&self, url: String) -> Result<()> {
        let tx = self.tx.lock().clone().ok_or(ScanError::FrontierClosed)?;
        tx.send_async(url)
            .await
            .map_err(|_| ScanError::FrontierClosed)
    }

    /// Enqueues `url` without waiting. A full queue hands the URL back as
    /// `Ok(Some(url))`.
    pub fn try_push(&self, url: String) -> Result<Option<String>> {
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(ScanError::FrontierClosed)?;
        match tx.try_send(url) {
            Ok(()) => Ok(None),
            Err(flume::TrySendError::Full(url)) => Ok(Some(url)),
            Err(flume::TrySendError::Disconnected(_)) => Err(ScanError::FrontierClosed),
        }
    }

    /// Next pending URL, or `None` once the queue is closed and empty.
    pub async fn next(&self) -> Option<String> {
        self.rx.recv_async().await.ok()
    }

    /// Returns `true` only for the call that actually closed the queue.
    pub fn close(&self) -> bool {
        self.tx.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(4);
        frontier.push("a".to_string()).await.unwrap();
        frontier.push("b".to_string()).await.unwrap();
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.next().await.as_deref(), Some("a"));
        assert_eq!(frontier.next().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let frontier = Frontier::new(4);
        frontier.push("a".to_string()).await.unwrap();

        assert!(frontier.close());
        assert!(!frontier.close());
        assert!(frontier.is_closed());

        assert_eq!(frontier.next().await.as_deref(), Some("a"));
        assert_eq!(frontier.next().await, None);
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let frontier = Frontier::new(4);
        frontier.close();
        let err = frontier.push("a".to_string()).await.unwrap_err();
        assert!(matches!(err, ScanError::FrontierClosed));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_receivers() {
        let frontier = Arc::new(Frontier::new(4));
        let receivers: Vec<_> = (0..3)
            .map(|_| {
                let frontier = frontier.clone();
                tokio::spawn(async move { frontier.next().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.close();

        for receiver in receivers {
            assert_eq!(receiver.await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_try_push_hands_back_when_full() {
        let frontier = Frontier::new(1);
        assert_eq!(frontier.try_push("a".to_string()).unwrap(), None);
        assert_eq!(
            frontier.try_push("b".to_string()).unwrap().as_deref(),
            Some("b")
        );
        assert_eq!(frontier.len(), 1);

        frontier.close();
        let err = frontier.try_push("c".to_string()).unwrap_err();
        assert!(matches!(err, ScanError::FrontierClosed));
        assert_eq!(frontier.next().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_push_waits_for_capacity() {
        let frontier = Arc::new(Frontier::new(1));
        frontier.push("a".to_string()).await.unwrap();

        let pusher = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.push("b".to_string()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pusher.is_finished());

        assert_eq!(frontier.next().await.as_deref(), Some("a"));
        pusher.await.unwrap().unwrap();
        assert_eq!(frontier.next().await.as_deref(), Some("b"));
    }
}
