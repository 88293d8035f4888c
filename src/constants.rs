// -
// Chunked message lists

/// Capacity of the first chunk allocated for a message list. Later chunks
/// double the capacity of the chunk before them.
pub const FIRST_CHUNK_SIZE: usize = 32;

// -
// Listener registries

pub const MAX_SYSCACHE_CALLBACKS: usize = 64;
pub const MAX_RELCACHE_CALLBACKS: usize = 10;
pub const MAX_PARTCACHE_CALLBACKS: usize = 10;

// -
// Wire format

/// Every message occupies one fixed-size slot on the shared queue.
pub const MESSAGE_SLOT_SIZE: usize = 16;

/// Kind ids for the non catalog-entry messages. Catalog-entry messages carry
/// their (non-negative) cache id in the same byte.
pub(crate) const KIND_WHOLE_CATALOG: i8 = -1;
pub(crate) const KIND_RELATION: i8 = -2;
pub(crate) const KIND_STORAGE: i8 = -3;
pub(crate) const KIND_RELATION_MAP: i8 = -4;
pub(crate) const KIND_PARTITION: i8 = -5;
pub(crate) const KIND_FUNCTION: i8 = -6;
pub(crate) const KIND_STORAGE_HASH_BUCKET: i8 = -7;

/// Largest backend id that fits in the 24 bits reserved for it.
pub const MAX_BACKEND_ID: i32 = (1 << 23) - 1;

/// Largest catalog cache id; the byte is shared with negative kind ids.
pub const MAX_CACHE_ID: u8 = i8::MAX as u8 - 1;
