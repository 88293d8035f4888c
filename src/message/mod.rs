//! Invalidation message model.
//!
//! A closed set of message kinds describing which cached catalog or storage
//! state has gone stale. Applying a message is idempotent and messages of the
//! same class commute, so the order inside one list never matters.

mod codec;
mod commit_record;
pub use codec::*;
pub use commit_record::*;

#[cfg(test)]
mod commit_record_test;
#[cfg(test)]
mod message_test;

use serde::Deserialize;
use serde::Serialize;

/// Object identifier of a database, catalog, relation, partition or function
pub type Oid = u32;

/// Zero never names a real object; used as the "applies everywhere" database
/// and as the flush-all argument passed to listeners.
pub const INVALID_OID: Oid = 0;

/// Identifier of one catalog (syscache) lookup cache
pub type CacheId = u8;

/// Identifier of a server backend process
pub type BackendId = i32;

pub const INVALID_BACKEND_ID: BackendId = -1;

/// Identifier of a hash bucket in a bucketed relation
pub type BucketId = i16;

/// Database scope of a message.
///
/// `Shared` messages concern global objects and apply to every backend,
/// whichever database it is connected to. There is no partial matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbScope {
    Shared,
    Database(Oid),
}

impl DbScope {
    pub fn from_oid(db_id: Oid) -> Self {
        if db_id == INVALID_OID {
            DbScope::Shared
        } else {
            DbScope::Database(db_id)
        }
    }

    pub fn as_oid(self) -> Oid {
        match self {
            DbScope::Shared => INVALID_OID,
            DbScope::Database(db_id) => db_id,
        }
    }

    /// Folds `Database(INVALID_OID)` into `Shared`, the form it takes once
    /// it has crossed the wire
    pub fn normalized(self) -> Self {
        DbScope::from_oid(self.as_oid())
    }

    /// Whether a backend connected to `current_db` must act on this scope
    pub fn applies_to(
        self,
        current_db: Oid,
    ) -> bool {
        match self.normalized() {
            DbScope::Shared => true,
            DbScope::Database(db_id) => db_id == current_db,
        }
    }
}

/// Physical location of a relation's files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RelFileNode {
    pub spc_node: Oid,
    pub db_node: Oid,
    pub rel_node: Oid,
}

/// Reference to an open low-level storage handle, as passed to
/// [`LocalCaches::close_storage_handle`](crate::LocalCaches::close_storage_handle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageHandleRef {
    pub node: RelFileNode,
    pub backend: BackendId,
    /// Set for hash-bucket storage, which is always a regular relation
    pub bucket: Option<BucketId>,
}

impl StorageHandleRef {
    pub fn regular(node: RelFileNode) -> Self {
        Self {
            node,
            backend: INVALID_BACKEND_ID,
            bucket: None,
        }
    }
}

/// Dispatch class of a message. Transactional lists keep one chunked list per
/// class and always process them in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageClass {
    Catalog,
    Relation,
    Partition,
    /// Storage and relation-map messages only travel through the immediate
    /// channel and never sit in a transactional list.
    NonTransactional,
}

impl MessageClass {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageClass::Catalog => "catalog",
            MessageClass::Relation => "relation",
            MessageClass::Partition => "partition",
            MessageClass::NonTransactional => "non_transactional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationMessage {
    /// One cached catalog row is stale
    CatalogEntry {
        cache_id: CacheId,
        hash_value: u32,
        db: DbScope,
    },
    /// Every cached row of a catalog is stale
    WholeCatalog { db: DbScope, catalog_id: Oid },
    /// One relation descriptor is stale
    Relation { db: DbScope, relation_id: Oid },
    /// One partition descriptor is stale
    Partition { db: DbScope, partition_id: Oid },
    /// Cached plans and compiled state of one function are stale
    Function { db: DbScope, function_id: Oid },
    /// Open handles on a relation's files must be closed
    Storage {
        backend_id: BackendId,
        node: RelFileNode,
    },
    /// Open handles on one bucket of a hash-bucketed relation must be closed
    StorageHashBucket { bucket_id: BucketId, node: RelFileNode },
    /// The relation-to-file mapping must be re-read
    RelationMap { db: DbScope },
}

impl InvalidationMessage {
    pub fn class(&self) -> MessageClass {
        match self {
            InvalidationMessage::CatalogEntry { .. } | InvalidationMessage::WholeCatalog { .. } => {
                MessageClass::Catalog
            }
            InvalidationMessage::Relation { .. } | InvalidationMessage::Function { .. } => {
                MessageClass::Relation
            }
            InvalidationMessage::Partition { .. } => MessageClass::Partition,
            InvalidationMessage::Storage { .. }
            | InvalidationMessage::StorageHashBucket { .. }
            | InvalidationMessage::RelationMap { .. } => MessageClass::NonTransactional,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            InvalidationMessage::CatalogEntry { .. } => "catalog_entry",
            InvalidationMessage::WholeCatalog { .. } => "whole_catalog",
            InvalidationMessage::Relation { .. } => "relation",
            InvalidationMessage::Partition { .. } => "partition",
            InvalidationMessage::Function { .. } => "function",
            InvalidationMessage::Storage { .. } => "storage",
            InvalidationMessage::StorageHashBucket { .. } => "storage_hash_bucket",
            InvalidationMessage::RelationMap { .. } => "relation_map",
        }
    }

    /// Database scope, if the message carries one. Storage messages never do:
    /// a backend may hold file handles for relations of any database.
    pub fn db(&self) -> Option<DbScope> {
        match *self {
            InvalidationMessage::CatalogEntry { db, .. }
            | InvalidationMessage::WholeCatalog { db, .. }
            | InvalidationMessage::Relation { db, .. }
            | InvalidationMessage::Partition { db, .. }
            | InvalidationMessage::Function { db, .. }
            | InvalidationMessage::RelationMap { db } => Some(db),
            InvalidationMessage::Storage { .. } | InvalidationMessage::StorageHashBucket { .. } => {
                None
            }
        }
    }

    /// Same message with its database scope normalized
    pub fn normalized(self) -> Self {
        match self {
            InvalidationMessage::CatalogEntry {
                cache_id,
                hash_value,
                db,
            } => InvalidationMessage::CatalogEntry {
                cache_id,
                hash_value,
                db: db.normalized(),
            },
            InvalidationMessage::WholeCatalog { db, catalog_id } => InvalidationMessage::WholeCatalog {
                db: db.normalized(),
                catalog_id,
            },
            InvalidationMessage::Relation { db, relation_id } => InvalidationMessage::Relation {
                db: db.normalized(),
                relation_id,
            },
            InvalidationMessage::Partition { db, partition_id } => InvalidationMessage::Partition {
                db: db.normalized(),
                partition_id,
            },
            InvalidationMessage::Function { db, function_id } => InvalidationMessage::Function {
                db: db.normalized(),
                function_id,
            },
            InvalidationMessage::RelationMap { db } => InvalidationMessage::RelationMap {
                db: db.normalized(),
            },
            storage @ (InvalidationMessage::Storage { .. }
            | InvalidationMessage::StorageHashBucket { .. }) => storage,
        }
    }

    /// Builds the storage message matching `handle`: hash-bucket storage gets
    /// its own kind, everything else carries the owning backend.
    pub fn for_storage(handle: StorageHandleRef) -> Self {
        match handle.bucket {
            Some(bucket_id) => InvalidationMessage::StorageHashBucket {
                bucket_id,
                node: handle.node,
            },
            None => InvalidationMessage::Storage {
                backend_id: handle.backend,
                node: handle.node,
            },
        }
    }
}
