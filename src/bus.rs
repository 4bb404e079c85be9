use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because we hop across threads.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget. Having no subscribers is not an error.
    pub fn publish(&self, msg: T) {
        let _ = self.tx.send(Arc::new(msg));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

/// Single-slot inlet: a new value replaces whatever is still pending.
pub fn latest<T>() -> (LatestSender<T>, LatestReceiver<T>) {
    let (tx, rx) = watch::channel(None);
    (LatestSender { tx }, LatestReceiver { rx })
}

#[derive(Debug)]
pub struct LatestSender<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> LatestSender<T> {
    /// Returns `false` once the receiving side is gone.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(Some(value)).is_ok()
    }
}

#[derive(Debug)]
pub struct LatestReceiver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> LatestReceiver<T> {
    /// The newest value if it has not been taken yet.
    pub fn take_pending(&mut self) -> Option<T> {
        let value = self.rx.borrow_and_update();
        if value.has_changed() {
            (*value).clone()
        } else {
            None
        }
    }

    /// Waits for the next value. `None` once the sender is dropped and
    /// nothing is pending.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        (*self.rx.borrow_and_update()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_publish_without_subscribers() {
        let topic: Topic<u32> = Topic::new(4);
        topic.publish(1);
        let mut rx = topic.subscribe();
        topic.publish(2);
        assert_eq!(*rx.try_recv().unwrap(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_latest_newest_wins() {
        let (tx, mut rx) = latest();
        assert_eq!(rx.take_pending(), None);
        assert!(tx.send(1));
        assert!(tx.send(2));
        assert!(tx.send(3));
        assert_eq!(rx.take_pending(), Some(3));
        assert_eq!(rx.take_pending(), None);
    }

    #[test]
    fn test_latest_pending_survives_sender_drop() {
        let (tx, mut rx) = latest();
        tx.send(7);
        drop(tx);
        assert_eq!(rx.take_pending(), Some(7));
        assert_eq!(rx.take_pending(), None);
    }

    #[test]
    fn test_latest_send_fails_without_receiver() {
        let (tx, rx) = latest::<u8>();
        drop(rx);
        assert!(!tx.send(1));
    }

    #[tokio::test]
    async fn test_latest_recv() {
        let (tx, mut rx) = latest();
        tx.send(5);
        tx.send(6);
        assert_eq!(rx.recv().await, Some(6));
        assert_eq!(rx.take_pending(), None);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }
}
