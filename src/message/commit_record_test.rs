use super::*;

#[test]
fn test_commit_record_encoding() {
    let record = CommitRecord {
        messages: vec![
            InvalidationMessage::CatalogEntry {
                cache_id: 4,
                hash_value: 99,
                db: DbScope::Database(16384),
            },
            InvalidationMessage::Relation {
                db: DbScope::Shared,
                relation_id: 1262,
            },
        ],
        relcache_init_file_inval: true,
    };

    let bytes = record.encode().expect("should encode");
    let decoded = CommitRecord::decode(&bytes).expect("should decode");

    assert_eq!(decoded, record);
}

#[test]
fn test_commit_record_decode_garbage_fails() {
    assert!(CommitRecord::decode(&[0xff; 3]).is_err());
}

#[test]
fn test_default_record_is_empty() {
    let record = CommitRecord::default();
    assert!(record.is_empty());
    assert!(!record.relcache_init_file_inval);
}
