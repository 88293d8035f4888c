//! Boundary to the cross-process shared invalidation queue.
//!
//! The queue is an at-least-once channel between backends. A backend hands
//! committed invalidations to [`SharedQueue::broadcast`] and periodically
//! drains what other backends (and itself) sent with
//! [`SharedQueue::poll_incoming`].

mod mem_queue;
pub use mem_queue::*;


#[cfg(test)]
use mockall::automock;

use crate::InvalidationMessage;
use crate::Result;

/// One item drained from the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingEvent {
    Message(InvalidationMessage),
    /// The reader fell behind and messages were lost; every local cache must
    /// be treated as stale
    Reset,
}

#[cfg_attr(test, automock)]
pub trait SharedQueue: Send + Sync + 'static {
    /// Publishes messages to every backend. For transactional messages this
    /// must only be called once the commit is durable.
    fn broadcast(
        &self,
        messages: &[InvalidationMessage],
    ) -> Result<()>;

    /// Drains everything delivered to this reader since the last poll
    fn poll_incoming(&self) -> Result<Vec<IncomingEvent>>;
}
