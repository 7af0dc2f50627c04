//! Mock implementations for testing.

use async_trait::async_trait;
use coordinator::{Notification, Notifier, NotifyError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Notifier that captures notifications in memory.
///
/// Implements the same `Notifier` trait as the real dispatcher, so tests see
/// exactly what would have been sent to the log and webhook channels.
#[derive(Clone)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    /// Simulate delivery failures if set.
    should_fail: Arc<Mutex<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Get all captured notifications.
    pub fn captured(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Waits until at least `count` notifications arrived. Delivery runs off
    /// the request path, so tests poll.
    pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
        for _ in 0..100 {
            let sent = self.captured();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.captured()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if *self.should_fail.lock() {
            return Err(NotifyError::Status(503));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_notifier_captures() {
        let mock = MockNotifier::new();
        let alert = Notification::WaitingBacklog {
            waiting: 7,
            threshold: 5,
        };
        mock.notify(&alert).await.unwrap();
        assert_eq!(mock.captured(), vec![alert]);
    }

    #[tokio::test]
    async fn test_mock_notifier_failure_mode() {
        let mock = MockNotifier::new();
        mock.set_should_fail(true);
        let alert = Notification::WaitingBacklog {
            waiting: 1,
            threshold: 1,
        };
        assert!(mock.notify(&alert).await.is_err());
        assert!(mock.captured().is_empty());
    }
}
