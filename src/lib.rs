//! Transactional cache invalidation for multi-process database servers.
//!
//! Each backend keeps local caches of catalog rows, relation descriptors and
//! partition descriptors. When a transaction changes a catalog, the caches of
//! every backend must eventually drop the stale entries, but other backends
//! must not see anything before the transaction commits. [`InvalSession`]
//! queues invalidations per (sub)transaction, applies them locally at command
//! boundaries and aborts, and hands them to a [`SharedQueue`] at commit.
//!
//! ```ignore
//! let mut session = InvalSession::new(config, caches, queue, Box::new(NoInitFile))?;
//! session.start()?;
//! session.register_relation(DbScope::Database(db), rel_id)?;
//! session.command_boundary();
//! let record = session.flatten_for_commit_record()?;
//! // ... make `record` durable ...
//! session.top_commit()?;
//! ```

mod config;
mod constants;
mod core;
mod errors;
mod list;
mod message;
mod metrics;
mod transport;

pub use config::*;
pub use constants::*;
pub use core::*;
pub use errors::*;
pub use list::*;
pub use message::*;
pub use metrics::*;
pub use transport::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
