//! Invalidation Dispatcher Error Hierarchy
//!
//! Defines the error types raised by the invalidation stack, the local
//! dispatcher, the listener registries and the wire codec.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Illegal transitions of the transaction invalidation stack
    #[error(transparent)]
    Transaction(#[from] TransactionStateError),

    /// Listener registration failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Wire and commit-record encoding failures
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Failure reported by the cross-process shared queue
    #[error("Shared queue error: {0}")]
    Transport(String),

    /// Unrecoverable failures requiring session termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Error {
    /// Fatal errors leave local cache state undefined; the caller must end the
    /// session instead of continuing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactionStateError {
    /// Operation requires a transaction frame but the stack is empty
    #[error("No active transaction for invalidation processing")]
    NoActiveTransaction,

    /// Top-level start while a transaction is already open
    #[error("Transaction already in progress (nesting level {level})")]
    AlreadyInTransaction { level: u32 },

    /// Subtransaction end requested at the top level
    #[error("Operation requires an open subtransaction")]
    NotInSubtransaction,

    /// Top-level commit or commit-record flattening with live subtransactions
    #[error("{depth} invalidation frames still open; subtransactions must be resolved first")]
    UnresolvedSubtransactions { depth: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Registration beyond the configured bound
    #[error("Out of {kind} callback slots (max {max})")]
    Full { kind: &'static str, max: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Byte slice shorter or longer than one message slot
    #[error("invalid slot length: expected {expected} bytes, received {actual} bytes")]
    InvalidSlotLength { expected: usize, actual: usize },

    /// Batch length is not a multiple of the slot size
    #[error("truncated message batch of {0} bytes")]
    TruncatedBatch(usize),

    /// Backend id cannot be packed into the 24-bit storage field
    #[error("backend id {0} out of encodable range")]
    BackendIdOutOfRange(i32),

    /// Catalog cache ids must stay below the reserved negative kind ids
    #[error("catalog cache id {0} out of range")]
    CacheIdOutOfRange(u8),

    /// Commit record serialization failures
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Codec(CodecError::Bincode(e))
    }
}
