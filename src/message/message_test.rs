use super::*;

#[test]
fn test_db_scope_from_oid_maps_zero_to_shared() {
    assert_eq!(DbScope::from_oid(INVALID_OID), DbScope::Shared);
    assert_eq!(DbScope::from_oid(16384), DbScope::Database(16384));
    assert_eq!(DbScope::Shared.as_oid(), INVALID_OID);
}

#[test]
fn test_db_scope_matching_is_exact_or_wildcard() {
    assert!(DbScope::Shared.applies_to(1));
    assert!(DbScope::Shared.applies_to(16384));
    assert!(DbScope::Database(16384).applies_to(16384));
    assert!(!DbScope::Database(16384).applies_to(16385));
}

#[test]
fn test_database_zero_scope_behaves_as_shared() {
    let zero = DbScope::Database(INVALID_OID);
    assert_eq!(zero.normalized(), DbScope::Shared);
    assert_eq!(DbScope::Database(16384).normalized(), DbScope::Database(16384));
    assert!(zero.applies_to(16384));

    let msg = InvalidationMessage::Function {
        db: zero,
        function_id: 2200,
    };
    let normalized = msg.normalized();
    assert_eq!(
        normalized,
        InvalidationMessage::Function {
            db: DbScope::Shared,
            function_id: 2200,
        }
    );
    let decoded = crate::decode_batch(&crate::encode_batch(&[msg]).unwrap()).unwrap();
    assert_eq!(decoded, vec![normalized]);
}

#[test]
fn test_message_classes() {
    let db = DbScope::Database(5);
    let cases = [
        (
            InvalidationMessage::CatalogEntry {
                cache_id: 3,
                hash_value: 7,
                db,
            },
            MessageClass::Catalog,
        ),
        (
            InvalidationMessage::WholeCatalog { db, catalog_id: 1259 },
            MessageClass::Catalog,
        ),
        (
            InvalidationMessage::Relation { db, relation_id: 42 },
            MessageClass::Relation,
        ),
        (
            InvalidationMessage::Function { db, function_id: 42 },
            MessageClass::Relation,
        ),
        (
            InvalidationMessage::Partition { db, partition_id: 42 },
            MessageClass::Partition,
        ),
        (
            InvalidationMessage::RelationMap { db },
            MessageClass::NonTransactional,
        ),
        (
            InvalidationMessage::Storage {
                backend_id: INVALID_BACKEND_ID,
                node: RelFileNode::default(),
            },
            MessageClass::NonTransactional,
        ),
    ];

    for (msg, class) in cases {
        assert_eq!(msg.class(), class, "{}", msg.kind_name());
    }
}

#[test]
fn test_storage_messages_have_no_db_scope() {
    let msg = InvalidationMessage::StorageHashBucket {
        bucket_id: 3,
        node: RelFileNode::default(),
    };
    assert_eq!(msg.db(), None);
    assert_eq!(
        InvalidationMessage::RelationMap { db: DbScope::Shared }.db(),
        Some(DbScope::Shared)
    );
}

#[test]
fn test_for_storage_picks_bucket_kind() {
    let node = RelFileNode {
        spc_node: 1663,
        db_node: 5,
        rel_node: 16400,
    };

    let regular = InvalidationMessage::for_storage(StorageHandleRef {
        node,
        backend: 12,
        bucket: None,
    });
    assert_eq!(
        regular,
        InvalidationMessage::Storage {
            backend_id: 12,
            node
        }
    );

    let bucketed = InvalidationMessage::for_storage(StorageHandleRef {
        node,
        backend: INVALID_BACKEND_ID,
        bucket: Some(9),
    });
    assert_eq!(
        bucketed,
        InvalidationMessage::StorageHashBucket { bucket_id: 9, node }
    );
}
