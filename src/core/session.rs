//! Per-backend invalidation session.
//!
//! [`InvalSession`] owns everything one backend needs to keep its caches
//! coherent: the stack of transaction frames, the local dispatcher with its
//! listener registries, the handle on the shared queue and the relcache init
//! file collaborator. The surrounding transaction machinery drives it through
//! the lifecycle calls (`start`, `command_boundary`, `top_commit`, ...), and
//! catalog code feeds it through the `register_*` calls.

use std::sync::Arc;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::InvalidationStack;
use super::LocalCaches;
use super::LocalDispatcher;
use super::RelcacheInitFile;
use super::XactState;
use crate::metrics::BROADCAST_MESSAGES_METRIC;
use crate::metrics::REGISTERED_MESSAGES_METRIC;
use crate::metrics::TRANSACTION_EVENTS_METRIC;
use crate::CacheId;
use crate::CallbackRegistry;
use crate::CodecError;
use crate::CommitRecord;
use crate::DbScope;
use crate::IncomingEvent;
use crate::InvalConfig;
use crate::InvalidationMessage;
use crate::MessageClass;
use crate::Oid;
use crate::Result;
use crate::SharedQueue;
use crate::StorageHandleRef;
use crate::TransactionStateError;
use crate::MAX_CACHE_ID;

pub struct InvalSession {
    config: InvalConfig,
    stack: InvalidationStack,
    dispatcher: LocalDispatcher,
    queue: Arc<dyn SharedQueue>,
    init_file: Box<dyn RelcacheInitFile>,
}

impl std::fmt::Debug for InvalSession {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("InvalSession")
            .field("database_id", &self.dispatcher.database_id())
            .field("state", &self.stack.state())
            .finish()
    }
}

impl InvalSession {
    /// Creates a session for the database named in `config`.
    ///
    /// The configuration is validated first; a session never runs with an
    /// unvalidated config.
    pub fn new(
        config: InvalConfig,
        caches: Box<dyn LocalCaches>,
        queue: Arc<dyn SharedQueue>,
        init_file: Box<dyn RelcacheInitFile>,
    ) -> Result<Self> {
        let config = config.validate()?;
        let callbacks = CallbackRegistry::new(config.callbacks.clone());
        let dispatcher = LocalDispatcher::new(config.session.database_id, caches, callbacks);
        let stack = InvalidationStack::new(config.lists.first_chunk_size);

        debug!("invalidation session for database {}", config.session.database_id);
        Ok(Self {
            config,
            stack,
            dispatcher,
            queue,
            init_file,
        })
    }

    pub fn config(&self) -> &InvalConfig {
        &self.config
    }

    pub fn database_id(&self) -> Oid {
        self.dispatcher.database_id()
    }

    pub fn state(&self) -> XactState {
        self.stack.state()
    }

    pub fn stack(&self) -> &InvalidationStack {
        &self.stack
    }

    // --- Transaction lifecycle ---------------------------------------------

    /// Opens the top-level frame at transaction start
    pub fn start(&mut self) -> Result<()> {
        self.stack.push_top()?;
        TRANSACTION_EVENTS_METRIC.with_label_values(&["start"]).inc();
        Ok(())
    }

    /// Opens a frame for a new subtransaction
    pub fn sub_start(&mut self) -> Result<()> {
        self.stack.push_sub()?;
        TRANSACTION_EVENTS_METRIC.with_label_values(&["sub_start"]).inc();
        Ok(())
    }

    /// Applies what the finished command registered to the local caches and
    /// moves it to the frame's prior commands. Quietly does nothing outside a
    /// transaction.
    pub fn command_boundary(&mut self) {
        let frame = match self.stack.innermost_mut() {
            Some(frame) => frame,
            None => return,
        };
        if frame.current_cmd.is_empty() {
            return;
        }

        trace!(
            "command boundary at level {}: {} messages",
            frame.level,
            frame.current_cmd.len()
        );
        self.dispatcher.apply_all(frame.current_cmd.iter());
        frame.prior_cmds.append(&mut frame.current_cmd);
    }

    /// Hands the innermost subtransaction's invalidations to its parent
    pub fn sub_commit(&mut self) -> Result<()> {
        if self.stack.depth() < 2 {
            return Err(TransactionStateError::NotInSubtransaction.into());
        }
        self.command_boundary();
        self.stack.merge_into_parent()?;
        TRANSACTION_EVENTS_METRIC.with_label_values(&["sub_commit"]).inc();
        Ok(())
    }

    /// Drops the innermost subtransaction frame, re-applying its prior
    /// commands locally so nothing it loaded survives. Messages of the
    /// unfinished command were never applied and are discarded.
    ///
    /// Without an open subtransaction this is a no-op, so aborting the same
    /// level twice is harmless.
    pub fn sub_abort(&mut self) {
        if self.stack.depth() < 2 {
            debug!("sub_abort without an open subtransaction frame");
            return;
        }
        if let Some(frame) = self.stack.pop() {
            self.dispatcher.apply_all(frame.prior_cmds.iter());
            TRANSACTION_EVENTS_METRIC.with_label_values(&["sub_abort"]).inc();
        }
    }

    /// Broadcasts every invalidation of the committing transaction.
    ///
    /// Must only be called once the commit record is durable. On error the
    /// frame stays in place so the caller can still run [`Self::top_abort`].
    pub fn top_commit(&mut self) -> Result<()> {
        match self.stack.depth() {
            0 => return Err(TransactionStateError::NoActiveTransaction.into()),
            1 => {}
            depth => return Err(TransactionStateError::UnresolvedSubtransactions { depth }.into()),
        }

        let frame = self.stack.current_frame_mut()?;
        let init_file_inval = frame.relcache_init_file_inval;
        if init_file_inval {
            self.init_file.pre_invalidate()?;
        }

        frame.prior_cmds.append(&mut frame.current_cmd);
        if !frame.prior_cmds.is_empty() {
            let messages: Vec<InvalidationMessage> = frame.prior_cmds.iter().copied().collect();
            debug!("broadcasting {} committed invalidations", messages.len());
            self.queue.broadcast(&messages)?;
            BROADCAST_MESSAGES_METRIC
                .with_label_values(&["commit"])
                .inc_by(messages.len() as u64);
        }

        if init_file_inval {
            self.init_file.post_invalidate()?;
        }

        self.stack.pop();
        TRANSACTION_EVENTS_METRIC.with_label_values(&["top_commit"]).inc();
        Ok(())
    }

    /// Undoes locally whatever the aborted transaction made this backend
    /// load. Nothing is broadcast. Open subtransactions are unwound first.
    pub fn top_abort(&mut self) {
        if self.stack.is_empty() {
            debug!("top_abort outside a transaction");
            return;
        }
        while self.stack.depth() > 1 {
            self.sub_abort();
        }
        if let Some(frame) = self.stack.pop() {
            self.dispatcher.apply_all(frame.prior_cmds.iter());
        }
        TRANSACTION_EVENTS_METRIC.with_label_values(&["top_abort"]).inc();
    }

    /// After PREPARE the local caches must look as if the transaction never
    /// happened; a later commit of the prepared transaction re-broadcasts
    /// from its commit record.
    pub fn post_prepare(&mut self) {
        TRANSACTION_EVENTS_METRIC.with_label_values(&["post_prepare"]).inc();
        self.top_abort();
    }

    // --- Transactional registration ----------------------------------------

    pub fn register_catalog_entry(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
        db: DbScope,
    ) -> Result<()> {
        if cache_id > MAX_CACHE_ID {
            return Err(CodecError::CacheIdOutOfRange(cache_id).into());
        }
        let frame = self.stack.current_frame_mut()?;
        frame
            .current_cmd
            .add_catalog_entry(cache_id, hash_value, db.normalized());
        Self::count_registered(MessageClass::Catalog);
        Ok(())
    }

    pub fn register_whole_catalog(
        &mut self,
        db: DbScope,
        catalog_id: Oid,
    ) -> Result<()> {
        let frame = self.stack.current_frame_mut()?;
        frame
            .current_cmd
            .add_whole_catalog(db.normalized(), catalog_id);
        Self::count_registered(MessageClass::Catalog);
        Ok(())
    }

    /// Queues a relation descriptor invalidation. A relation stored in the
    /// init file also schedules the file's removal at commit.
    pub fn register_relation(
        &mut self,
        db: DbScope,
        relation_id: Oid,
    ) -> Result<()> {
        let frame = self.stack.current_frame_mut()?;
        if frame.current_cmd.add_relation(db.normalized(), relation_id) {
            Self::count_registered(MessageClass::Relation);
        }
        if self.init_file.contains(relation_id) {
            trace!("relation {} is in the relcache init file", relation_id);
            frame.relcache_init_file_inval = true;
        }
        Ok(())
    }

    pub fn register_partition(
        &mut self,
        db: DbScope,
        partition_id: Oid,
    ) -> Result<()> {
        let frame = self.stack.current_frame_mut()?;
        if frame.current_cmd.add_partition(db.normalized(), partition_id) {
            Self::count_registered(MessageClass::Partition);
        }
        Ok(())
    }

    pub fn register_function(
        &mut self,
        db: DbScope,
        function_id: Oid,
    ) -> Result<()> {
        let frame = self.stack.current_frame_mut()?;
        if frame.current_cmd.add_function(db.normalized(), function_id) {
            Self::count_registered(MessageClass::Relation);
        }
        Ok(())
    }

    /// Invalidates every cached row of a catalog, scoped to all databases
    /// for shared catalogs
    pub fn register_catalog_invalidation(
        &mut self,
        catalog_id: Oid,
        shared: bool,
    ) -> Result<()> {
        let db = self.scope_for(shared);
        self.register_whole_catalog(db, catalog_id)
    }

    pub fn register_relation_invalidation(
        &mut self,
        relation_id: Oid,
        shared: bool,
    ) -> Result<()> {
        let db = self.scope_for(shared);
        self.register_relation(db, relation_id)
    }

    fn scope_for(
        &self,
        shared: bool,
    ) -> DbScope {
        if shared {
            DbScope::Shared
        } else {
            DbScope::Database(self.database_id())
        }
    }

    fn count_registered(class: MessageClass) {
        REGISTERED_MESSAGES_METRIC
            .with_label_values(&[class.as_str()])
            .inc();
    }

    // --- Listeners ---------------------------------------------------------

    /// Registers a listener for one catalog cache. A hash of zero means the
    /// whole cache was flushed, which a real row hash can also be.
    pub fn register_syscache_listener<F>(
        &mut self,
        cache_id: CacheId,
        f: F,
    ) -> Result<()>
    where
        F: FnMut(CacheId, u32) + Send + 'static,
    {
        self.dispatcher.callbacks_mut().register_syscache(cache_id, f)
    }

    pub fn register_relation_listener<F>(
        &mut self,
        f: F,
    ) -> Result<()>
    where
        F: FnMut(Oid) + Send + 'static,
    {
        self.dispatcher.callbacks_mut().register_relcache(f)
    }

    pub fn register_partition_listener<F>(
        &mut self,
        f: F,
    ) -> Result<()>
    where
        F: FnMut(Oid) + Send + 'static,
    {
        self.dispatcher.callbacks_mut().register_partcache(f)
    }

    // --- Immediate channel -------------------------------------------------

    /// Broadcasts one message right away, bypassing the transaction stack.
    /// Legal outside any transaction; cannot be rolled back.
    pub fn send_immediate(
        &self,
        msg: InvalidationMessage,
    ) -> Result<()> {
        let msg = msg.normalized();
        trace!("immediate {:?}", msg);
        self.queue.broadcast(&[msg])?;
        BROADCAST_MESSAGES_METRIC.with_label_values(&["immediate"]).inc();
        Ok(())
    }

    /// Tells every backend to close its handles on a relation's files
    pub fn invalidate_storage(
        &self,
        handle: StorageHandleRef,
    ) -> Result<()> {
        self.send_immediate(InvalidationMessage::for_storage(handle))
    }

    pub fn invalidate_relation_map(
        &self,
        db: DbScope,
    ) -> Result<()> {
        self.send_immediate(InvalidationMessage::RelationMap { db })
    }

    /// For catalog rows updated in place, which no rollback can undo
    pub fn invalidate_tuple_inplace(
        &self,
        cache_id: CacheId,
        hash_value: u32,
        db: DbScope,
    ) -> Result<()> {
        if cache_id > MAX_CACHE_ID {
            return Err(CodecError::CacheIdOutOfRange(cache_id).into());
        }
        self.send_immediate(InvalidationMessage::CatalogEntry {
            cache_id,
            hash_value,
            db,
        })
    }

    // --- Commit records and the shared queue -------------------------------

    /// Flattens the top-level frame for the commit record, catalog class
    /// first. Read-only: must run before [`Self::top_commit`] empties the
    /// lists.
    pub fn flatten_for_commit_record(&self) -> Result<CommitRecord> {
        let frame = match self.stack.depth() {
            0 => return Err(TransactionStateError::NoActiveTransaction.into()),
            1 => self
                .stack
                .innermost()
                .ok_or(TransactionStateError::NoActiveTransaction)?,
            depth => return Err(TransactionStateError::UnresolvedSubtransactions { depth }.into()),
        };

        let mut messages = Vec::with_capacity(frame.prior_cmds.len() + frame.current_cmd.len());
        for class in [MessageClass::Catalog, MessageClass::Relation, MessageClass::Partition] {
            messages.extend(frame.prior_cmds.class_iter(class).copied());
            messages.extend(frame.current_cmd.class_iter(class).copied());
        }

        Ok(CommitRecord {
            messages,
            relcache_init_file_inval: frame.relcache_init_file_inval,
        })
    }

    /// Re-broadcasts the invalidations of a replayed commit record. Runs
    /// without a transaction frame.
    pub fn process_committed_messages(
        &mut self,
        record: &CommitRecord,
    ) -> Result<()> {
        if record.is_empty() {
            return Ok(());
        }
        debug!(
            "replaying commit with {} messages{}",
            record.messages.len(),
            if record.relcache_init_file_inval {
                " and relcache file invalidation"
            } else {
                ""
            }
        );

        if record.relcache_init_file_inval {
            self.init_file.pre_invalidate()?;
        }
        self.queue.broadcast(&record.messages)?;
        BROADCAST_MESSAGES_METRIC
            .with_label_values(&["replay"])
            .inc_by(record.messages.len() as u64);
        if record.relcache_init_file_inval {
            self.init_file.post_invalidate()?;
        }
        Ok(())
    }

    /// Drains the shared queue and applies what arrived. Returns the number
    /// of events handled.
    pub fn accept_invalidation_messages(&mut self) -> Result<usize> {
        let events = self.queue.poll_incoming()?;
        for event in &events {
            match event {
                IncomingEvent::Message(msg) => self.dispatcher.apply(msg),
                IncomingEvent::Reset => {
                    warn!("shared queue overflow, discarding all cached state");
                    self.dispatcher.reset_all();
                }
            }
        }
        Ok(events.len())
    }

    /// Flushes every local cache and fires every listener with its
    /// flush-all argument
    pub fn reset_all(&mut self) {
        self.dispatcher.reset_all();
    }
}
