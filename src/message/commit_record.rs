use serde::Deserialize;
use serde::Serialize;

use super::InvalidationMessage;
use crate::Result;

/// Invalidations of a committing top-level transaction, flattened for
/// embedding in its durability record.
///
/// Replaying the record through
/// [`InvalSession::process_committed_messages`](crate::InvalSession::process_committed_messages)
/// reproduces the broadcast the committing backend performed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Catalog-class messages first, then relation-class, then partition-class
    pub messages: Vec<InvalidationMessage>,
    /// The relcache init file must be removed around the broadcast
    pub relcache_init_file_inval: bool,
}

impl CommitRecord {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
