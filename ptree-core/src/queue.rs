//! Bounded work queue between the scheduler and the worker pool.
//!
//! A single [`QueueProducer`] feeds any number of cloned
//! [`QueueConsumer`]s. When the queue is full, [`QueueProducer::push`]
//! waits; that is the only backpressure in the system.
//!
//! The queue also tracks how many addresses are waiting so the producer
//! can await [`QueueProducer::drained`] instead of polling the length.

use std::net::Ipv6Addr;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};

use crate::error::PtreeResult;

/// Constructor namespace for the producer/consumer pair.
pub struct WorkQueue;

impl WorkQueue {
    /// Create a queue holding at most `capacity` addresses (minimum 1).
    pub fn bounded(capacity: usize) -> (QueueProducer, QueueConsumer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (pending, _) = watch::channel(0usize);
        let pending = Arc::new(pending);

        let producer = QueueProducer {
            tx,
            pending: Arc::clone(&pending),
        };
        let consumer = QueueConsumer {
            rx: Arc::new(Mutex::new(rx)),
            pending,
        };
        (producer, consumer)
    }
}

// ── QueueProducer ────────────────────────────────────────────────

/// Write half, owned by the scheduler.
#[derive(Debug)]
pub struct QueueProducer {
    tx: mpsc::Sender<Ipv6Addr>,
    pending: Arc<watch::Sender<usize>>,
}

impl QueueProducer {
    /// Enqueue one address, waiting for room if the queue is full.
    ///
    /// Fails only when every consumer has been dropped.
    pub async fn push(&self, addr: Ipv6Addr) -> PtreeResult<()> {
        let permit = self.tx.reserve().await?;
        self.pending.send_if_modified(|n| {
            *n += 1;
            false
        });
        permit.send(addr);
        Ok(())
    }

    /// Enqueue every address in order.
    pub async fn push_all(&self, addrs: &[Ipv6Addr]) -> PtreeResult<()> {
        for addr in addrs {
            self.push(*addr).await?;
        }
        Ok(())
    }

    /// Addresses enqueued but not yet taken by a worker.
    pub fn len(&self) -> usize {
        *self.pending.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered addresses.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Resolves once every enqueued address has been taken by a worker.
    pub async fn drained(&self) {
        let mut rx = self.pending.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

// ── QueueConsumer ────────────────────────────────────────────────

/// Read half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct QueueConsumer {
    rx: Arc<Mutex<mpsc::Receiver<Ipv6Addr>>>,
    pending: Arc<watch::Sender<usize>>,
}

impl QueueConsumer {
    /// Take the next address. `None` once the producer is gone and the
    /// queue is empty.
    pub async fn pop(&self) -> Option<Ipv6Addr> {
        let addr = self.rx.lock().await.recv().await?;
        self.pending.send_if_modified(|n| {
            *n = n.saturating_sub(1);
            *n == 0
        });
        Some(addr)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready};

    fn addr(n: u16) -> Ipv6Addr {
        Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, n)
    }

    #[tokio::test]
    async fn fifo_delivery() {
        let (tx, rx) = WorkQueue::bounded(4);
        tx.push_all(&[addr(1), addr(2), addr(3)]).await.unwrap();
        assert_eq!(tx.len(), 3);
        assert_eq!(rx.pop().await, Some(addr(1)));
        assert_eq!(rx.pop().await, Some(addr(2)));
        assert_eq!(rx.pop().await, Some(addr(3)));
        assert!(tx.is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let (tx, _rx) = WorkQueue::bounded(0);
        assert_eq!(tx.capacity(), 1);
    }

    #[tokio::test]
    async fn full_queue_blocks_producer() {
        let (tx, rx) = WorkQueue::bounded(2);
        tx.push(addr(1)).await.unwrap();
        tx.push(addr(2)).await.unwrap();

        let mut push = tokio_test::task::spawn(tx.push(addr(3)));
        assert_pending!(push.poll());

        assert_eq!(rx.pop().await, Some(addr(1)));
        assert!(push.is_woken());
        assert_ready!(push.poll()).unwrap();
        assert_eq!(tx.len(), 2);
    }

    #[tokio::test]
    async fn drained_waits_for_consumers() {
        let (tx, rx) = WorkQueue::bounded(3);
        tx.push_all(&[addr(1), addr(2)]).await.unwrap();

        let mut drained = tokio_test::task::spawn(tx.drained());
        assert_pending!(drained.poll());

        rx.pop().await.unwrap();
        assert_pending!(drained.poll());

        rx.pop().await.unwrap();
        assert_ready!(drained.poll());
    }

    #[tokio::test]
    async fn drained_resolves_immediately_when_empty() {
        let (tx, _rx) = WorkQueue::bounded(3);
        tokio::time::timeout(Duration::from_secs(1), tx.drained())
            .await
            .expect("empty queue is already drained");
    }

    #[tokio::test]
    async fn consumers_see_close() {
        let (tx, rx) = WorkQueue::bounded(1);
        tx.push(addr(9)).await.unwrap();
        drop(tx);
        assert_eq!(rx.pop().await, Some(addr(9)));
        assert_eq!(rx.pop().await, None);
    }

    #[tokio::test]
    async fn push_fails_without_consumers() {
        let (tx, rx) = WorkQueue::bounded(1);
        drop(rx);
        assert!(tx.push(addr(1)).await.is_err());
    }
}
