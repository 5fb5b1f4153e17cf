use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

struct Slot<T> {
    value: Option<T>,
    closed: bool,
    dropped: usize,
}

/// Single-slot mailbox between the capture source and the one processing worker.
///
/// A newer capture replaces an unconsumed older one, which is counted as dropped.
pub struct CaptureMailbox<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
}

impl<T> CaptureMailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
                dropped: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value`, returning `true` if it displaced an unprocessed capture.
    /// Posts after `close` are discarded.
    pub fn post(&self, value: T) -> bool {
        let replaced = {
            let mut slot = self.lock();
            if slot.closed {
                return false;
            }
            let replaced = slot.value.replace(value).is_some();
            if replaced {
                slot.dropped += 1;
            }
            replaced
        };
        self.notify.notify_one();
        replaced
    }

    pub fn try_take(&self) -> Option<T> {
        self.lock().value.take()
    }

    /// Waits for the next capture; `None` once closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut slot = self.lock();
                if let Some(value) = slot.value.take() {
                    return Some(value);
                }
                if slot.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }
}

impl<T> Default for CaptureMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn newer_capture_replaces_older() {
        let mailbox = CaptureMailbox::new();
        assert!(!mailbox.post(1));
        assert!(mailbox.post(2));
        assert!(mailbox.post(3));
        assert_eq!(mailbox.dropped(), 2);
        assert_eq!(mailbox.try_take(), Some(3));
        assert_eq!(mailbox.try_take(), None);
    }

    #[test]
    fn closed_mailbox_discards_posts() {
        let mailbox = CaptureMailbox::new();
        mailbox.close();
        assert!(!mailbox.post(7));
        assert!(mailbox.is_closed());
        assert_eq!(mailbox.try_take(), None);
    }

    #[tokio::test]
    async fn recv_wakes_on_post() {
        let mailbox = Arc::new(CaptureMailbox::new());
        let consumer = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        mailbox.post("capture");
        assert_eq!(consumer.await.unwrap(), Some("capture"));
    }

    #[tokio::test]
    async fn recv_drains_before_reporting_close() {
        let mailbox = CaptureMailbox::new();
        mailbox.post(5);
        mailbox.close();
        assert_eq!(mailbox.recv().await, Some(5));
        assert_eq!(mailbox.recv().await, None);
    }
}
