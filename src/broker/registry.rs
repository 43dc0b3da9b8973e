//! Topic registry
//!
//! Maps topic names to topics. Topics are created lazily on first reference
//! and never removed, so the registry only grows.
//!
//! Concurrency notes:
//! - The map sits behind a `std::sync::Mutex` that is held only for the
//!   lookup-or-insert. Callers get an `Arc<Topic>` back and enqueue/dequeue
//!   on it without touching the registry lock.
//! - The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::broker::topic::Topic;

#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: Mutex<HashMap<String, Arc<Topic>>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the topic called `name`, creating it if this is the first
    /// reference. Names are compared byte for byte.
    ///
    /// Concurrent calls with the same unseen name create exactly one topic
    /// and all of them observe it.
    pub fn resolve(&self, name: &str) -> Arc<Topic> {
        let mut topics = self.lock();
        if let Some(topic) = topics.get(name) {
            return Arc::clone(topic);
        }

        let topic = Arc::new(Topic::new(name));
        topics.insert(name.to_string(), Arc::clone(&topic));
        tracing::debug!(topic = name, "created queue for topic");
        topic
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Topic>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
