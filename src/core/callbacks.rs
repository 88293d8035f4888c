use tracing::debug;
use tracing::error;

use crate::CacheId;
use crate::CallbackConfig;
use crate::Oid;
use crate::RegistryError;
use crate::Result;
use crate::INVALID_OID;

/// Called with the cache id and the hash value of the invalidated row.
///
/// A hash value of zero requests a flush of everything cached for that
/// cache id. Zero is also a computable hash, so a genuine row with hash zero
/// causes a full flush for its listeners; listeners must tolerate that.
pub type SyscacheCallback = Box<dyn FnMut(CacheId, u32) + Send>;

/// Called with the invalidated relation id, or [`INVALID_OID`] for all
pub type RelcacheCallback = Box<dyn FnMut(Oid) + Send>;

/// Called with the invalidated partition id, or [`INVALID_OID`] for all
pub type PartcacheCallback = Box<dyn FnMut(Oid) + Send>;

struct SyscacheCallbackItem {
    cache_id: CacheId,
    function: SyscacheCallback,
}

/// Listeners notified after local cache invalidation.
///
/// Listeners are registered once during session setup and live as long as the
/// session; there is no way to unregister one.
pub struct CallbackRegistry {
    syscache: Vec<SyscacheCallbackItem>,
    relcache: Vec<RelcacheCallback>,
    partcache: Vec<PartcacheCallback>,
    limits: CallbackConfig,
}

impl CallbackRegistry {
    pub fn new(limits: CallbackConfig) -> Self {
        Self {
            syscache: Vec::new(),
            relcache: Vec::new(),
            partcache: Vec::new(),
            limits,
        }
    }

    pub fn register_syscache<F>(
        &mut self,
        cache_id: CacheId,
        function: F,
    ) -> Result<()>
    where
        F: FnMut(CacheId, u32) + Send + 'static,
    {
        check_slots("syscache", self.syscache.len(), self.limits.max_syscache_callbacks)?;
        self.syscache.push(SyscacheCallbackItem {
            cache_id,
            function: Box::new(function),
        });
        debug!("registered syscache callback for cache {}", cache_id);
        Ok(())
    }

    pub fn register_relcache<F>(
        &mut self,
        function: F,
    ) -> Result<()>
    where
        F: FnMut(Oid) + Send + 'static,
    {
        check_slots("relcache", self.relcache.len(), self.limits.max_relcache_callbacks)?;
        self.relcache.push(Box::new(function));
        Ok(())
    }

    pub fn register_partcache<F>(
        &mut self,
        function: F,
    ) -> Result<()>
    where
        F: FnMut(Oid) + Send + 'static,
    {
        check_slots("partcache", self.partcache.len(), self.limits.max_partcache_callbacks)?;
        self.partcache.push(Box::new(function));
        Ok(())
    }

    /// Fires every syscache listener registered for `cache_id`, in
    /// registration order
    pub fn call_syscache(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
    ) {
        for item in self.syscache.iter_mut().filter(|item| item.cache_id == cache_id) {
            (item.function)(cache_id, hash_value);
        }
    }

    pub fn call_relcache(
        &mut self,
        relation_id: Oid,
    ) {
        for function in self.relcache.iter_mut() {
            function(relation_id);
        }
    }

    pub fn call_partcache(
        &mut self,
        partition_id: Oid,
    ) {
        for function in self.partcache.iter_mut() {
            function(partition_id);
        }
    }

    /// Fires every listener once with its flush-all argument
    pub fn call_all_for_reset(&mut self) {
        for item in self.syscache.iter_mut() {
            (item.function)(item.cache_id, 0);
        }
        self.call_relcache(INVALID_OID);
        self.call_partcache(INVALID_OID);
    }

    pub fn syscache_count(&self) -> usize {
        self.syscache.len()
    }

    pub fn relcache_count(&self) -> usize {
        self.relcache.len()
    }

    pub fn partcache_count(&self) -> usize {
        self.partcache.len()
    }
}

fn check_slots(
    kind: &'static str,
    used: usize,
    max: usize,
) -> Result<()> {
    if used >= max {
        error!("out of {} callback slots (max {})", kind, max);
        return Err(RegistryError::Full { kind, max }.into());
    }
    Ok(())
}
