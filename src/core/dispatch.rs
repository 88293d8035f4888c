//! Local application of invalidation messages.

#[cfg(test)]
use mockall::automock;
use tracing::trace;
use tracing::warn;

use super::CallbackRegistry;
use crate::metrics::CACHE_RESET_METRIC;
use crate::metrics::LOCAL_APPLIED_METRIC;
use crate::CacheId;
use crate::DbScope;
use crate::InvalidationMessage;
use crate::Oid;
use crate::StorageHandleRef;

/// The backend-local caches an invalidation acts on.
///
/// Implementations own the actual cache storage; the dispatcher only decides
/// which entry to evict and when.
#[cfg_attr(test, automock)]
pub trait LocalCaches: Send + 'static {
    /// Evicts one catalog row from the given catalog cache
    fn evict_catalog_entry(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
    );

    /// Evicts every cached row of a catalog and returns the ids of the
    /// catalog caches that were flushed
    fn flush_catalog(
        &mut self,
        catalog_id: Oid,
    ) -> Vec<CacheId>;

    fn evict_relation(
        &mut self,
        relation_id: Oid,
    );

    fn evict_partition(
        &mut self,
        partition_id: Oid,
    );

    /// Drops cached plans and compiled state of a function
    fn drop_function_artifact(
        &mut self,
        function_id: Oid,
    );

    fn close_storage_handle(
        &mut self,
        handle: StorageHandleRef,
    );

    /// Re-reads the relation mapping; `shared` selects the global mapping
    /// instead of the current database's
    fn invalidate_relation_map(
        &mut self,
        shared: bool,
    );

    fn reset_catalog_caches(&mut self);

    /// Also drops storage handles and relation mappings
    fn reset_relation_cache(&mut self);

    fn reset_partition_cache(&mut self);
}

/// Applies messages to the local caches of one backend and notifies the
/// registered listeners.
pub struct LocalDispatcher {
    database_id: Oid,
    caches: Box<dyn LocalCaches>,
    callbacks: CallbackRegistry,
}

impl LocalDispatcher {
    pub fn new(
        database_id: Oid,
        caches: Box<dyn LocalCaches>,
        callbacks: CallbackRegistry,
    ) -> Self {
        Self {
            database_id,
            caches,
            callbacks,
        }
    }

    pub fn database_id(&self) -> Oid {
        self.database_id
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    /// Applies one message. Messages scoped to another concrete database are
    /// skipped without touching caches or listeners.
    pub fn apply(
        &mut self,
        msg: &InvalidationMessage,
    ) {
        if let Some(db) = msg.db() {
            if !db.applies_to(self.database_id) {
                trace!("skip {:?}: not for database {}", msg, self.database_id);
                return;
            }
        }
        trace!("apply {:?}", msg);
        LOCAL_APPLIED_METRIC.with_label_values(&[msg.kind_name()]).inc();

        match *msg {
            InvalidationMessage::CatalogEntry {
                cache_id,
                hash_value,
                ..
            } => {
                self.caches.evict_catalog_entry(cache_id, hash_value);
                self.callbacks.call_syscache(cache_id, hash_value);
            }
            InvalidationMessage::WholeCatalog { catalog_id, .. } => {
                for cache_id in self.caches.flush_catalog(catalog_id) {
                    self.callbacks.call_syscache(cache_id, 0);
                }
            }
            InvalidationMessage::Relation { relation_id, .. } => {
                self.caches.evict_relation(relation_id);
                self.callbacks.call_relcache(relation_id);
            }
            InvalidationMessage::Partition { partition_id, .. } => {
                self.caches.evict_partition(partition_id);
                self.callbacks.call_partcache(partition_id);
            }
            InvalidationMessage::Function { function_id, .. } => {
                self.caches.drop_function_artifact(function_id);
            }
            InvalidationMessage::Storage { backend_id, node } => {
                self.caches.close_storage_handle(StorageHandleRef {
                    node,
                    backend: backend_id,
                    bucket: None,
                });
            }
            InvalidationMessage::StorageHashBucket { bucket_id, node } => {
                self.caches.close_storage_handle(StorageHandleRef {
                    bucket: Some(bucket_id),
                    ..StorageHandleRef::regular(node)
                });
            }
            InvalidationMessage::RelationMap { db } => {
                self.caches
                    .invalidate_relation_map(matches!(db, DbScope::Shared));
            }
        }
    }

    pub fn apply_all<'a, I>(
        &mut self,
        messages: I,
    ) where
        I: IntoIterator<Item = &'a InvalidationMessage>,
    {
        for msg in messages {
            self.apply(msg);
        }
    }

    /// Flushes every cache and fires every listener with its flush-all
    /// argument. Used when messages may have been lost and it is unknown
    /// which entries are stale.
    pub fn reset_all(&mut self) {
        warn!("resetting all local caches of database {}", self.database_id);
        CACHE_RESET_METRIC.inc();

        self.caches.reset_catalog_caches();
        self.caches.reset_relation_cache();
        self.caches.reset_partition_cache();
        self.callbacks.call_all_for_reset();
    }
}
