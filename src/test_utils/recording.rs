use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::CacheId;
use crate::LocalCaches;
use crate::Oid;
use crate::StorageHandleRef;

/// One call observed by [`RecordingCaches`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCall {
    EvictCatalogEntry(CacheId, u32),
    FlushCatalog(Oid),
    EvictRelation(Oid),
    EvictPartition(Oid),
    DropFunction(Oid),
    CloseStorage(StorageHandleRef),
    RelationMap { shared: bool },
    ResetCatalog,
    ResetRelation,
    ResetPartition,
}

pub type CallLog = Arc<Mutex<Vec<CacheCall>>>;

/// [`LocalCaches`] fake that records every call in order into a log shared
/// with the test.
#[derive(Debug, Default)]
pub struct RecordingCaches {
    log: CallLog,
    catalog_caches: HashMap<Oid, Vec<CacheId>>,
}

impl RecordingCaches {
    pub fn new() -> (Self, CallLog) {
        let caches = Self::default();
        let log = caches.log.clone();
        (caches, log)
    }

    /// Declares which catalog caches `flush_catalog(catalog_id)` reports
    pub fn with_catalog_caches(
        mut self,
        catalog_id: Oid,
        cache_ids: Vec<CacheId>,
    ) -> Self {
        self.catalog_caches.insert(catalog_id, cache_ids);
        self
    }

    fn record(
        &self,
        call: CacheCall,
    ) {
        self.log.lock().push(call);
    }
}

impl LocalCaches for RecordingCaches {
    fn evict_catalog_entry(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
    ) {
        self.record(CacheCall::EvictCatalogEntry(cache_id, hash_value));
    }

    fn flush_catalog(
        &mut self,
        catalog_id: Oid,
    ) -> Vec<CacheId> {
        self.record(CacheCall::FlushCatalog(catalog_id));
        self.catalog_caches
            .get(&catalog_id)
            .cloned()
            .unwrap_or_default()
    }

    fn evict_relation(
        &mut self,
        relation_id: Oid,
    ) {
        self.record(CacheCall::EvictRelation(relation_id));
    }

    fn evict_partition(
        &mut self,
        partition_id: Oid,
    ) {
        self.record(CacheCall::EvictPartition(partition_id));
    }

    fn drop_function_artifact(
        &mut self,
        function_id: Oid,
    ) {
        self.record(CacheCall::DropFunction(function_id));
    }

    fn close_storage_handle(
        &mut self,
        handle: StorageHandleRef,
    ) {
        self.record(CacheCall::CloseStorage(handle));
    }

    fn invalidate_relation_map(
        &mut self,
        shared: bool,
    ) {
        self.record(CacheCall::RelationMap { shared });
    }

    fn reset_catalog_caches(&mut self) {
        self.record(CacheCall::ResetCatalog);
    }

    fn reset_relation_cache(&mut self) {
        self.record(CacheCall::ResetRelation);
    }

    fn reset_partition_cache(&mut self) {
        self.record(CacheCall::ResetPartition);
    }
}
