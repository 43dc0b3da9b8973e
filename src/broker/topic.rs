//! Topic management
//!
//! A `Topic` binds a name to the one queue that carries its messages. The
//! binding is fixed for the lifetime of the broker.

use std::sync::Arc;

use crate::broker::queue::MessageQueue;

#[derive(Debug)]
pub struct Topic {
    pub name: String,
    queue: Arc<MessageQueue>,
}

impl Topic {
    /// Create a new topic with the given name and an empty queue.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue: Arc::new(MessageQueue::new()),
        }
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }
}
