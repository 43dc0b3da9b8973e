//! The `broker` module holds the in-process state shared by all connections:
//! the topic registry and the per-topic message queues.

pub mod queue;
pub mod registry;
pub mod topic;

pub use queue::MessageQueue;
pub use registry::TopicRegistry;
pub use topic::Topic;
