//! Deferred storage mutations.
//!
//! Producers push [`Transaction`]s into an unbounded MPSC channel; the owner
//! thread drains it in FIFO order at the top of every plan.

use crossbeam_channel::{Receiver, Sender};
use tracing::trace;

use super::storage::Storage;

/// A queued mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction<T> {
    /// Start tracking the object.
    Add(T),
    /// Stop tracking the object.
    Remove(T),
    /// The object changed.
    Update(T),
}

impl<T> Transaction<T> {
    /// The object this transaction targets.
    pub fn object(&self) -> &T {
        match self {
            Self::Add(obj) | Self::Remove(obj) | Self::Update(obj) => obj,
        }
    }

    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Update(_) => "update",
        }
    }

    /// Applies the transaction to `storage`.
    ///
    /// Adds and updates are checked against [`Storage::will_accept`] again,
    /// since the object may have changed since it was queued. Removals are
    /// not, so an object that stopped being accepted can still be torn down.
    /// Returns false if the transaction was dropped.
    pub fn apply<S>(self, storage: &mut S) -> bool
    where
        S: Storage<T> + ?Sized,
    {
        match self {
            Self::Add(obj) => {
                if !storage.will_accept(&obj) {
                    return false;
                }
                storage.add(obj);
            }
            Self::Update(obj) => {
                if !storage.will_accept(&obj) {
                    return false;
                }
                storage.update(&obj);
            }
            Self::Remove(obj) => storage.remove(&obj),
        }
        true
    }
}

/// The consumer side of the transaction channel, owned by the manager.
#[derive(Debug)]
pub struct TransactionQueue<T> {
    sender: Sender<Transaction<T>>,
    receiver: Receiver<Transaction<T>>,
}

impl<T> TransactionQueue<T> {
    /// Creates an empty, unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Enqueues a transaction.
    pub fn push(&self, transaction: Transaction<T>) {
        // The queue owns a receiver, so the channel is never disconnected.
        let _ = self.sender.send(transaction);
    }

    /// A handle other threads can enqueue through.
    #[must_use]
    pub fn sender(&self) -> TransactionSender<T> {
        TransactionSender {
            sender: self.sender.clone(),
        }
    }

    /// Number of transactions waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Applies the transactions waiting on entry, oldest first.
    ///
    /// Transactions pushed while draining wait for the next pass, so a busy
    /// producer cannot stall the owner thread. Returns how many were applied
    /// and how many were dropped.
    pub fn drain_into<S>(&self, storage: &mut S) -> (usize, usize)
    where
        S: Storage<T> + ?Sized,
    {
        let mut applied = 0;
        let mut dropped = 0;
        let pending = self.receiver.len();
        for transaction in self.receiver.try_iter().take(pending) {
            let kind = transaction.kind();
            if transaction.apply(storage) {
                trace!(kind, "applied transaction");
                applied += 1;
            } else {
                trace!(kind, "dropped transaction, object no longer accepted");
                dropped += 1;
            }
        }
        (applied, dropped)
    }

    /// Throws away the transactions waiting on entry. Returns how many.
    pub fn discard(&self) -> usize {
        let pending = self.receiver.len();
        self.receiver.try_iter().take(pending).count()
    }
}

impl<T> Default for TransactionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable producer handle.
///
/// Unlike the manager's `queue_*` methods, a sender does not see the storage,
/// so acceptance is only checked when the transaction is applied. Removals
/// are applied without that check (see [`Transaction::apply`]), so a removal
/// sent for an object the storage rejects still reaches [`Storage::remove`].
#[derive(Debug)]
pub struct TransactionSender<T> {
    sender: Sender<Transaction<T>>,
}

impl<T> TransactionSender<T> {
    /// Queues an add.
    pub fn add(&self, obj: T) {
        self.send(Transaction::Add(obj));
    }

    /// Queues a removal.
    pub fn remove(&self, obj: T) {
        self.send(Transaction::Remove(obj));
    }

    /// Queues an update.
    pub fn update(&self, obj: T) {
        self.send(Transaction::Update(obj));
    }

    /// Queues a transaction. Silently dropped once the manager is gone.
    pub fn send(&self, transaction: Transaction<T>) {
        if self.sender.send(transaction).is_err() {
            trace!("transaction queue closed, dropping");
        }
    }
}

impl<T> Clone for TransactionSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancing::{DynamicInstance, TickableInstance};
    use std::collections::BTreeSet;

    /// Set-backed storage that rejects negative values.
    #[derive(Default)]
    struct SetStorage {
        live: BTreeSet<i32>,
        updates: Vec<i32>,
        removals: Vec<i32>,
        /// Queues `obj + 1` through this sender on every add.
        echo: Option<TransactionSender<i32>>,
    }

    impl Storage<i32> for SetStorage {
        fn will_accept(&self, obj: &i32) -> bool {
            *obj >= 0
        }

        fn add(&mut self, obj: i32) {
            self.live.insert(obj);
            if let Some(echo) = &self.echo {
                echo.add(obj + 1);
            }
        }

        fn remove(&mut self, obj: &i32) {
            self.removals.push(*obj);
            self.live.remove(obj);
        }

        fn update(&mut self, obj: &i32) {
            if self.live.contains(obj) {
                self.updates.push(*obj);
            }
        }

        fn instance_count(&self) -> usize {
            self.live.len()
        }

        fn tickable_instances(&mut self) -> Vec<&mut (dyn TickableInstance + '_)> {
            Vec::new()
        }

        fn dynamic_instances(&mut self) -> Vec<&mut (dyn DynamicInstance + '_)> {
            Vec::new()
        }

        fn recreate_all(&mut self) {}

        fn invalidate(&mut self) {
            self.live.clear();
        }
    }

    #[test]
    fn test_fifo_application() {
        let queue = TransactionQueue::new();
        let mut storage = SetStorage::default();

        queue.push(Transaction::Add(1));
        queue.push(Transaction::Update(1));
        queue.push(Transaction::Remove(1));
        queue.push(Transaction::Add(1));
        assert_eq!(queue.len(), 4);

        assert_eq!(queue.drain_into(&mut storage), (4, 0));
        assert!(queue.is_empty());
        assert!(storage.live.contains(&1));
        assert_eq!(storage.updates, vec![1]);
    }

    #[test]
    fn test_rejected_at_apply_time() {
        let queue = TransactionQueue::new();
        let mut storage = SetStorage::default();
        let sender = queue.sender();

        sender.add(-3);
        sender.add(3);
        sender.update(-3);
        sender.remove(-3);

        // The removal of -3 is applied, the add and update are dropped.
        assert_eq!(queue.drain_into(&mut storage), (2, 2));
        assert_eq!(storage.live.iter().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(storage.removals, vec![-3]);
    }

    #[test]
    fn test_drain_stops_at_entry_length() {
        let queue = TransactionQueue::new();
        let mut storage = SetStorage {
            echo: Some(queue.sender()),
            ..SetStorage::default()
        };

        queue.push(Transaction::Add(0));
        assert_eq!(queue.drain_into(&mut storage), (1, 0));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain_into(&mut storage), (1, 0));
        assert_eq!(queue.len(), 1);
        assert_eq!(storage.live.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_discard() {
        let queue = TransactionQueue::new();
        queue.push(Transaction::Add(1));
        queue.push(Transaction::Remove(2));
        assert_eq!(queue.discard(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_transaction_accessors() {
        let tx = Transaction::Update("chest");
        assert_eq!(*tx.object(), "chest");
        assert_eq!(tx.kind(), "update");
    }

    #[test]
    fn test_sender_outlives_queue() {
        let queue = TransactionQueue::<i32>::new();
        let sender = queue.sender();
        drop(queue);
        sender.add(1);
    }
}
