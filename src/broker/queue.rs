//! Per-topic message queue
//!
//! An unbounded FIFO shared by every producer and consumer of one topic.
//! Enqueue never waits. Dequeue waits until an item is available and hands
//! each item to exactly one caller, which gives competing-consumer delivery
//! when several subscribers share a topic.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct MessageQueue {
    items: Mutex<VecDeque<Bytes>>,
    available: Notify,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the back of the queue and wakes one waiter.
    pub fn enqueue(&self, message: Bytes) {
        self.lock().push_back(message);
        self.available.notify_one();
    }

    /// Removes the message at the front of the queue, waiting for one if the
    /// queue is empty.
    ///
    /// Cancel safe: if the future is dropped before it completes, no message
    /// has been removed.
    pub async fn dequeue(&self) -> Bytes {
        loop {
            // Register as a waiter before looking, so an enqueue landing
            // between the check and the await still wakes us.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (message, more) = {
                let mut items = self.lock();
                let message = items.pop_front();
                (message, !items.is_empty())
            };
            if let Some(message) = message {
                if more {
                    self.available.notify_one();
                }
                return message;
            }
            notified.await;
        }
    }

    /// Removes the front message without waiting.
    pub fn try_dequeue(&self) -> Option<Bytes> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The guarded section never panics, so a poisoned lock still holds a
    // consistent queue.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Bytes>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
