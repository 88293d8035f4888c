//! Fixed-slot wire format used on the shared invalidation queue.
//!
//! Layout of one 16-byte slot (integers little endian):
//!
//! | bytes  | content                                                    |
//! |--------|------------------------------------------------------------|
//! | 0      | kind id; `>= 0` is the cache id of a catalog-entry message |
//! | 1..4   | storage backend id (hi byte + lo u16) or bucket id         |
//! | 4..16  | up to three 32-bit payload words                           |

use tracing::error;

use super::BackendId;
use super::DbScope;
use super::InvalidationMessage;
use super::RelFileNode;
use super::INVALID_BACKEND_ID;
use crate::constants::*;
use crate::CodecError;
use crate::Error;
use crate::Result;

pub type MessageSlot = [u8; MESSAGE_SLOT_SIZE];

impl InvalidationMessage {
    pub fn encode(&self) -> Result<MessageSlot> {
        let mut slot = [0u8; MESSAGE_SLOT_SIZE];

        match *self {
            InvalidationMessage::CatalogEntry {
                cache_id,
                hash_value,
                db,
            } => {
                if cache_id > MAX_CACHE_ID {
                    return Err(CodecError::CacheIdOutOfRange(cache_id).into());
                }
                slot[0] = cache_id;
                put_words(&mut slot, &[db.as_oid(), hash_value]);
            }
            InvalidationMessage::WholeCatalog { db, catalog_id } => {
                slot[0] = KIND_WHOLE_CATALOG as u8;
                put_words(&mut slot, &[db.as_oid(), catalog_id]);
            }
            InvalidationMessage::Relation { db, relation_id } => {
                slot[0] = KIND_RELATION as u8;
                put_words(&mut slot, &[db.as_oid(), relation_id]);
            }
            InvalidationMessage::Partition { db, partition_id } => {
                slot[0] = KIND_PARTITION as u8;
                put_words(&mut slot, &[db.as_oid(), partition_id]);
            }
            InvalidationMessage::Function { db, function_id } => {
                slot[0] = KIND_FUNCTION as u8;
                put_words(&mut slot, &[db.as_oid(), function_id]);
            }
            InvalidationMessage::Storage { backend_id, node } => {
                let (hi, lo) = split_backend_id(backend_id)?;
                slot[0] = KIND_STORAGE as u8;
                slot[1] = hi as u8;
                slot[2..4].copy_from_slice(&lo.to_le_bytes());
                put_words(&mut slot, &[node.spc_node, node.db_node, node.rel_node]);
            }
            InvalidationMessage::StorageHashBucket { bucket_id, node } => {
                slot[0] = KIND_STORAGE_HASH_BUCKET as u8;
                slot[2..4].copy_from_slice(&bucket_id.to_le_bytes());
                put_words(&mut slot, &[node.spc_node, node.db_node, node.rel_node]);
            }
            InvalidationMessage::RelationMap { db } => {
                slot[0] = KIND_RELATION_MAP as u8;
                put_words(&mut slot, &[db.as_oid()]);
            }
        }

        Ok(slot)
    }

    /// Decodes one slot.
    ///
    /// An unknown kind id means the queue is corrupted or a peer speaks a
    /// different protocol; this is reported as [`Error::Fatal`].
    pub fn decode(slot: &[u8]) -> Result<Self> {
        if slot.len() != MESSAGE_SLOT_SIZE {
            return Err(CodecError::InvalidSlotLength {
                expected: MESSAGE_SLOT_SIZE,
                actual: slot.len(),
            }
            .into());
        }

        let kind = slot[0] as i8;
        let w0 = get_word(slot, 0);
        let w1 = get_word(slot, 1);
        let w2 = get_word(slot, 2);

        let msg = match kind {
            k if k >= 0 => InvalidationMessage::CatalogEntry {
                cache_id: k as u8,
                hash_value: w1,
                db: DbScope::from_oid(w0),
            },
            KIND_WHOLE_CATALOG => InvalidationMessage::WholeCatalog {
                db: DbScope::from_oid(w0),
                catalog_id: w1,
            },
            KIND_RELATION => InvalidationMessage::Relation {
                db: DbScope::from_oid(w0),
                relation_id: w1,
            },
            KIND_PARTITION => InvalidationMessage::Partition {
                db: DbScope::from_oid(w0),
                partition_id: w1,
            },
            KIND_FUNCTION => InvalidationMessage::Function {
                db: DbScope::from_oid(w0),
                function_id: w1,
            },
            KIND_STORAGE => {
                let hi = slot[1] as i8;
                let lo = u16::from_le_bytes([slot[2], slot[3]]);
                InvalidationMessage::Storage {
                    backend_id: ((hi as i32) << 16) | lo as i32,
                    node: RelFileNode {
                        spc_node: w0,
                        db_node: w1,
                        rel_node: w2,
                    },
                }
            }
            KIND_STORAGE_HASH_BUCKET => InvalidationMessage::StorageHashBucket {
                bucket_id: i16::from_le_bytes([slot[2], slot[3]]),
                node: RelFileNode {
                    spc_node: w0,
                    db_node: w1,
                    rel_node: w2,
                },
            },
            KIND_RELATION_MAP => InvalidationMessage::RelationMap {
                db: DbScope::from_oid(w0),
            },
            unknown => {
                error!("unrecognized invalidation message id: {}", unknown);
                return Err(Error::Fatal(format!(
                    "unrecognized invalidation message id: {}",
                    unknown
                )));
            }
        };

        Ok(msg)
    }
}

pub fn encode_batch(messages: &[InvalidationMessage]) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(messages.len() * MESSAGE_SLOT_SIZE);
    for msg in messages {
        buffer.extend_from_slice(&msg.encode()?);
    }
    Ok(buffer)
}

pub fn decode_batch(bytes: &[u8]) -> Result<Vec<InvalidationMessage>> {
    if bytes.len() % MESSAGE_SLOT_SIZE != 0 {
        return Err(CodecError::TruncatedBatch(bytes.len()).into());
    }
    bytes
        .chunks_exact(MESSAGE_SLOT_SIZE)
        .map(InvalidationMessage::decode)
        .collect()
}

fn split_backend_id(backend_id: BackendId) -> Result<(i8, u16)> {
    if backend_id != INVALID_BACKEND_ID && !(0..=MAX_BACKEND_ID).contains(&backend_id) {
        return Err(CodecError::BackendIdOutOfRange(backend_id).into());
    }
    Ok(((backend_id >> 16) as i8, (backend_id & 0xffff) as u16))
}

fn put_words(
    slot: &mut MessageSlot,
    words: &[u32],
) {
    for (i, word) in words.iter().enumerate() {
        let start = 4 + i * 4;
        slot[start..start + 4].copy_from_slice(&word.to_le_bytes());
    }
}

fn get_word(
    slot: &[u8],
    index: usize,
) -> u32 {
    let start = 4 + index * 4;
    u32::from_le_bytes([slot[start], slot[start + 1], slot[start + 2], slot[start + 3]])
}
