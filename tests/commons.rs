use std::sync::Arc;

use inval_engine::CacheId;
use inval_engine::InvalConfig;
use inval_engine::InvalSession;
use inval_engine::LocalCaches;
use inval_engine::MemorySharedQueue;
use inval_engine::NoInitFile;
use inval_engine::Oid;
use inval_engine::StorageHandleRef;
use parking_lot::Mutex;

pub const SHARED_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evicted {
    CatalogEntry(CacheId, u32),
    Catalog(Oid),
    Relation(Oid),
    Partition(Oid),
    Function(Oid),
    Storage(StorageHandleRef),
    RelationMap { shared: bool },
    Reset,
}

pub type EvictionLog = Arc<Mutex<Vec<Evicted>>>;

/// Local caches of one simulated backend
pub struct TrackingCaches {
    log: EvictionLog,
}

impl LocalCaches for TrackingCaches {
    fn evict_catalog_entry(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
    ) {
        self.log.lock().push(Evicted::CatalogEntry(cache_id, hash_value));
    }

    fn flush_catalog(
        &mut self,
        catalog_id: Oid,
    ) -> Vec<CacheId> {
        self.log.lock().push(Evicted::Catalog(catalog_id));
        Vec::new()
    }

    fn evict_relation(
        &mut self,
        relation_id: Oid,
    ) {
        self.log.lock().push(Evicted::Relation(relation_id));
    }

    fn evict_partition(
        &mut self,
        partition_id: Oid,
    ) {
        self.log.lock().push(Evicted::Partition(partition_id));
    }

    fn drop_function_artifact(
        &mut self,
        function_id: Oid,
    ) {
        self.log.lock().push(Evicted::Function(function_id));
    }

    fn close_storage_handle(
        &mut self,
        handle: StorageHandleRef,
    ) {
        self.log.lock().push(Evicted::Storage(handle));
    }

    fn invalidate_relation_map(
        &mut self,
        shared: bool,
    ) {
        self.log.lock().push(Evicted::RelationMap { shared });
    }

    fn reset_catalog_caches(&mut self) {
        self.log.lock().push(Evicted::Reset);
    }

    fn reset_relation_cache(&mut self) {}

    fn reset_partition_cache(&mut self) {}
}

pub struct Backend {
    pub session: InvalSession,
    pub evicted: EvictionLog,
}

impl Backend {
    /// Connects a new backend for `database_id` to `queue`
    pub fn connect(
        queue: &MemorySharedQueue,
        database_id: Oid,
    ) -> Self {
        let mut config = InvalConfig::default();
        config.session.database_id = database_id;

        let evicted: EvictionLog = Arc::new(Mutex::new(Vec::new()));
        let caches = TrackingCaches { log: evicted.clone() };
        let session = InvalSession::new(
            config,
            Box::new(caches),
            Arc::new(queue.subscribe()),
            Box::new(NoInitFile),
        )
        .expect("valid test config");

        Self { session, evicted }
    }

    /// Drains the shared queue and returns what this backend evicted since
    /// the last call
    pub fn sync(&mut self) -> Vec<Evicted> {
        self.session
            .accept_invalidation_messages()
            .expect("poll shared queue");
        std::mem::take(&mut *self.evicted.lock())
    }

    pub fn clear(&self) {
        self.evicted.lock().clear();
    }
}
