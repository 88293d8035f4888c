use inval_engine::CommitRecord;
use inval_engine::DbScope;
use inval_engine::MemorySharedQueue;

use crate::commons::Backend;
use crate::commons::Evicted;
use crate::commons::SHARED_QUEUE_CAPACITY;
use crate::enable_logger;

const DB: u32 = 16384;

#[test]
fn test_replayed_commit_record_reproduces_broadcast() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB);
    let mut recovery = Backend::connect(&queue, DB);
    let mut peer = Backend::connect(&queue, DB);
    let db = DbScope::Database(DB);

    writer.session.start().unwrap();
    writer.session.register_partition(db, 3).unwrap();
    writer.session.register_relation(db, 2).unwrap();
    writer.session.command_boundary();
    writer.session.register_whole_catalog(db, 1259).unwrap();
    let bytes = writer.session.flatten_for_commit_record().unwrap().encode().unwrap();
    // The writer dies after the record is durable but before broadcasting
    writer.session.top_abort();
    assert!(queue.is_empty());

    let record = CommitRecord::decode(&bytes).unwrap();
    recovery.session.process_committed_messages(&record).unwrap();

    assert_eq!(
        peer.sync(),
        vec![
            Evicted::Catalog(1259),
            Evicted::Relation(2),
            Evicted::Partition(3),
        ]
    );
}

#[test]
fn test_empty_commit_record_broadcasts_nothing() {
    enable_logger();
    let queue = MemorySharedQueue::new(SHARED_QUEUE_CAPACITY);
    let mut writer = Backend::connect(&queue, DB);

    writer.session.start().unwrap();
    let record = writer.session.flatten_for_commit_record().unwrap();
    writer.session.top_commit().unwrap();
    writer.session.process_committed_messages(&record).unwrap();

    assert!(record.is_empty());
    assert!(queue.is_empty());
    assert!(writer.sync().is_empty());
}

#[test]
fn test_corrupted_commit_record_is_rejected() {
    assert!(CommitRecord::decode(&[0xff, 0x01]).is_err());
}
