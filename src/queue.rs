//! Bounded hand-off between request intake and the worker pool.
//!
//! Producers never wait: [`WorkQueue::try_push`] either enqueues or reports
//! the queue as full, and the caller decides what to count. Closing drops the
//! only sender, after which consumers drain what is left and then observe a
//! disconnected channel.

use bytes::Bytes;
use parking_lot::RwLock;

/// A request body waiting to be accounted for by a worker.
#[derive(Debug)]
pub struct QueuedBody {
    pub body: Bytes,
    pub method: String,
}

impl QueuedBody {
    pub fn new(body: Bytes, method: impl Into<String>) -> Self {
        Self {
            body,
            method: method.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Result of a non-blocking push.
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Enqueued,
    /// At capacity; the item has been discarded.
    Full,
    /// Closed for shutdown; the item has been discarded.
    Closed,
}

/// Multi-producer, multi-consumer queue with a fixed capacity.
pub struct WorkQueue {
    sender: RwLock<Option<flume::Sender<QueuedBody>>>,
    receiver: flume::Receiver<QueuedBody>,
    capacity: usize,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
        }
    }

    /// Offer an item without ever waiting for space.
    pub fn try_push(&self, item: QueuedBody) -> PushOutcome {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return PushOutcome::Closed;
        };

        match sender.try_send(item) {
            Ok(()) => PushOutcome::Enqueued,
            Err(flume::TrySendError::Full(_)) => PushOutcome::Full,
            Err(flume::TrySendError::Disconnected(_)) => PushOutcome::Closed,
        }
    }

    /// Stop accepting items. Items already queued stay available to
    /// consumers. Returns `false` if the queue was already closed.
    pub fn close(&self) -> bool {
        self.sender.write().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// A consumer handle. Every item is delivered to exactly one consumer.
    pub fn consumer(&self) -> flume::Receiver<QueuedBody> {
        self.receiver.clone()
    }

    /// Items currently buffered.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(len: usize) -> QueuedBody {
        QueuedBody::new(Bytes::from(vec![b'x'; len]), "POST")
    }

    #[test]
    fn push_until_full() {
        let queue = WorkQueue::new(2);

        assert_eq!(queue.try_push(body(1)), PushOutcome::Enqueued);
        assert_eq!(queue.try_push(body(2)), PushOutcome::Enqueued);
        assert_eq!(queue.try_push(body(3)), PushOutcome::Full);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.capacity(), 2);
    }

    #[test]
    fn consuming_frees_capacity() {
        let queue = WorkQueue::new(1);
        let rx = queue.consumer();

        assert_eq!(queue.try_push(body(10)), PushOutcome::Enqueued);
        assert_eq!(queue.try_push(body(20)), PushOutcome::Full);

        let item = rx.try_recv().unwrap();
        assert_eq!(item.len(), 10);
        assert_eq!(item.method, "POST");
        assert_eq!(queue.try_push(body(30)), PushOutcome::Enqueued);
    }

    #[test]
    fn closed_queue_rejects_but_keeps_backlog() {
        let queue = WorkQueue::new(4);
        let rx = queue.consumer();
        queue.try_push(body(5));
        queue.try_push(body(6));

        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());
        assert_eq!(queue.try_push(body(7)), PushOutcome::Closed);

        let drained: Vec<usize> = rx.drain().map(|b| b.len()).collect();
        assert_eq!(drained, [5, 6]);
        assert!(rx.recv().is_err());
    }

    #[tokio::test]
    async fn async_consumer_sees_disconnect_after_drain() {
        let queue = WorkQueue::new(8);
        let rx = queue.consumer();
        queue.try_push(body(1));
        queue.close();

        assert!(rx.recv_async().await.is_ok());
        assert!(rx.recv_async().await.is_err());
    }

    #[test]
    fn each_item_goes_to_one_consumer() {
        let queue = WorkQueue::new(100);
        let a = queue.consumer();
        let b = queue.consumer();
        for i in 1..=100 {
            queue.try_push(body(i));
        }
        queue.close();

        let mut seen = 0;
        let mut total = 0;
        loop {
            match (a.try_recv(), b.try_recv()) {
                (Err(_), Err(_)) => break,
                (x, y) => {
                    for item in [x, y].into_iter().flatten() {
                        seen += 1;
                        total += item.len();
                    }
                }
            }
        }
        assert_eq!(seen, 100);
        assert_eq!(total, (1..=100).sum::<usize>());
    }
}
