use inval_engine::DbScope;
use inval_engine::MemorySharedQueue;
use inval_engine::RelFileNode;
use inval_engine::StorageHandleRef;

use crate::commons::Backend;
use crate::commons::Evicted;
use crate::commons::SHARED_QUEUE_CAPACITY;
use crate::enable_logger;

const DB_A: u32 = 16384;
const DB_B: u32 = 16385;

#[test]
fn test_committed_invalidations_reach_every_backend_of_the_database() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB_A);
    let mut peer = Backend::connect(&queue, DB_A);
    let mut other_db = Backend::connect(&queue, DB_B);

    writer.session.start().unwrap();
    writer
        .session
        .register_relation(DbScope::Database(DB_A), 42)
        .unwrap();
    writer
        .session
        .register_catalog_entry(11, 0xbeef, DbScope::Shared)
        .unwrap();

    // Nothing is visible before commit
    assert!(peer.sync().is_empty());

    writer.session.command_boundary();
    assert_eq!(
        writer.sync(),
        vec![Evicted::CatalogEntry(11, 0xbeef), Evicted::Relation(42)]
    );

    writer.session.top_commit().unwrap();

    assert_eq!(
        peer.sync(),
        vec![Evicted::CatalogEntry(11, 0xbeef), Evicted::Relation(42)]
    );
    assert_eq!(other_db.sync(), vec![Evicted::CatalogEntry(11, 0xbeef)]);
    // The committing backend reads its own broadcast back as well
    assert_eq!(
        writer.sync(),
        vec![Evicted::CatalogEntry(11, 0xbeef), Evicted::Relation(42)]
    );
}

#[test]
fn test_aborted_transaction_is_invisible_to_peers() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB_A);
    let mut peer = Backend::connect(&queue, DB_A);

    writer.session.start().unwrap();
    writer
        .session
        .register_partition(DbScope::Database(DB_A), 7)
        .unwrap();
    writer.session.command_boundary();
    writer.sync();

    writer.session.top_abort();

    assert_eq!(writer.sync(), vec![Evicted::Partition(7)]);
    assert!(peer.sync().is_empty());
    assert!(queue.is_empty());
}

#[test]
fn test_subtransaction_outcomes_decide_what_is_broadcast() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB_A);
    let mut peer = Backend::connect(&queue, DB_A);
    let db = DbScope::Database(DB_A);

    writer.session.start().unwrap();
    writer.session.sub_start().unwrap();
    writer.session.register_relation(db, 100).unwrap();
    writer.session.sub_commit().unwrap();
    writer.session.sub_start().unwrap();
    writer.session.register_relation(db, 200).unwrap();
    writer.session.command_boundary();
    writer.session.sub_abort();
    writer.session.top_commit().unwrap();

    assert_eq!(peer.sync(), vec![Evicted::Relation(100)]);
}

#[test]
fn test_storage_invalidation_needs_no_transaction() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let writer = Backend::connect(&queue, DB_A);
    let mut other_db = Backend::connect(&queue, DB_B);
    let handle = StorageHandleRef::regular(RelFileNode {
        spc_node: 1663,
        db_node: DB_A,
        rel_node: 24601,
    });

    writer.session.invalidate_storage(handle).unwrap();
    writer
        .session
        .invalidate_relation_map(DbScope::Database(DB_A))
        .unwrap();

    // File handles are closed everywhere; the local relation map only where
    // the database matches
    assert_eq!(other_db.sync(), vec![Evicted::Storage(handle)]);
}

#[test]
fn test_lagging_backend_resets_its_caches() {
    enable_logger();
    let queue = MemorySharedQueue::new(4);
    let mut writer = Backend::connect(&queue, DB_A);
    let mut lagging = Backend::connect(&queue, DB_A);

    for round in 0..3 {
        writer.session.start().unwrap();
        for rel in 0..2 {
            writer
                .session
                .register_relation(DbScope::Database(DB_A), round * 10 + rel)
                .unwrap();
        }
        writer.session.top_commit().unwrap();
        writer.sync();
    }

    assert_eq!(lagging.sync(), vec![Evicted::Reset]);
    assert!(lagging.sync().is_empty());
}

#[test]
fn test_listeners_fire_for_remote_invalidations() {
    use std::sync::Arc;

    use parking_lot::Mutex;

    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB_A);
    let mut peer = Backend::connect(&queue, DB_A);
    let fired = Arc::new(Mutex::new(Vec::new()));
    {
        let fired = fired.clone();
        peer.session
            .register_partition_listener(move |id| fired.lock().push(id))
            .unwrap();
    }

    writer.session.start().unwrap();
    writer
        .session
        .register_partition(DbScope::Database(DB_A), 5)
        .unwrap();
    writer.session.top_commit().unwrap();
    peer.sync();

    assert_eq!(*fired.lock(), vec![5]);
    peer.clear();
}
