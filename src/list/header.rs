use tracing::trace;

use super::ChunkedList;
use crate::constants::FIRST_CHUNK_SIZE;
use crate::CacheId;
use crate::DbScope;
use crate::InvalidationMessage;
use crate::MessageClass;
use crate::Oid;

/// Pending transactional invalidations, split by dispatch class.
///
/// Traversal always yields the whole catalog class, then the relation class,
/// then the partition class. Relation descriptors are rebuilt from catalog
/// rows; flushing a descriptor before the rows it is built from could reload
/// it from stale catalog entries.
///
/// Relation-class and partition-class lists never hold two entries for the
/// same object. The catalog class is not de-duplicated: repeats are harmless
/// and cheaper to apply twice than to search for.
#[derive(Debug, Clone)]
pub struct ListHeader {
    catalog: ChunkedList,
    relation: ChunkedList,
    partition: ChunkedList,
}

impl Default for ListHeader {
    fn default() -> Self {
        Self::new(FIRST_CHUNK_SIZE)
    }
}

impl ListHeader {
    pub fn new(first_chunk_size: usize) -> Self {
        Self {
            catalog: ChunkedList::new(first_chunk_size),
            relation: ChunkedList::new(first_chunk_size),
            partition: ChunkedList::new(first_chunk_size),
        }
    }

    pub fn add_catalog_entry(
        &mut self,
        cache_id: CacheId,
        hash_value: u32,
        db: DbScope,
    ) {
        self.catalog.push(InvalidationMessage::CatalogEntry {
            cache_id,
            hash_value,
            db,
        });
    }

    pub fn add_whole_catalog(
        &mut self,
        db: DbScope,
        catalog_id: Oid,
    ) {
        self.catalog
            .push(InvalidationMessage::WholeCatalog { db, catalog_id });
    }

    /// Returns false if the relation was already queued.
    ///
    /// The database is not compared: an object id never moves between
    /// databases, so the id alone identifies the entry.
    pub fn add_relation(
        &mut self,
        db: DbScope,
        relation_id: Oid,
    ) -> bool {
        let exists = self.relation.contains_where(|msg| {
            matches!(msg, InvalidationMessage::Relation { relation_id: id, .. } if *id == relation_id)
        });
        if exists {
            trace!("relation {} already queued", relation_id);
            return false;
        }
        self.relation
            .push(InvalidationMessage::Relation { db, relation_id });
        true
    }

    /// Returns false if the function was already queued
    pub fn add_function(
        &mut self,
        db: DbScope,
        function_id: Oid,
    ) -> bool {
        let exists = self.relation.contains_where(|msg| {
            matches!(msg, InvalidationMessage::Function { function_id: id, .. } if *id == function_id)
        });
        if exists {
            trace!("function {} already queued", function_id);
            return false;
        }
        self.relation
            .push(InvalidationMessage::Function { db, function_id });
        true
    }

    /// Returns false if the partition was already queued
    pub fn add_partition(
        &mut self,
        db: DbScope,
        partition_id: Oid,
    ) -> bool {
        let exists = self.partition.contains_where(|msg| {
            matches!(msg, InvalidationMessage::Partition { partition_id: id, .. } if *id == partition_id)
        });
        if exists {
            trace!("partition {} already queued", partition_id);
            return false;
        }
        self.partition
            .push(InvalidationMessage::Partition { db, partition_id });
        true
    }

    /// Moves all three classes of `src` into this header, class by class
    pub fn append(
        &mut self,
        src: &mut ListHeader,
    ) {
        self.catalog.append(&mut src.catalog);
        self.relation.append(&mut src.relation);
        self.partition.append(&mut src.partition);
    }

    /// Messages in dispatch order: catalog, relation, partition
    pub fn iter(&self) -> impl Iterator<Item = &InvalidationMessage> + '_ {
        self.catalog
            .iter()
            .chain(self.relation.iter())
            .chain(self.partition.iter())
    }

    /// Chunk-sized slices in dispatch order
    pub fn batches(&self) -> impl Iterator<Item = &[InvalidationMessage]> + '_ {
        self.catalog
            .batches()
            .chain(self.relation.batches())
            .chain(self.partition.batches())
    }

    /// Messages of one dispatch class
    pub fn class_iter(
        &self,
        class: MessageClass,
    ) -> Box<dyn Iterator<Item = &InvalidationMessage> + '_> {
        match class {
            MessageClass::Catalog => Box::new(self.catalog.iter()),
            MessageClass::Relation => Box::new(self.relation.iter()),
            MessageClass::Partition => Box::new(self.partition.iter()),
            MessageClass::NonTransactional => Box::new(std::iter::empty()),
        }
    }

    pub fn contains(
        &self,
        msg: &InvalidationMessage,
    ) -> bool {
        self.class_iter(msg.class()).any(|queued| queued == msg)
    }

    pub fn len(&self) -> usize {
        self.catalog.len() + self.relation.len() + self.partition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty() && self.relation.is_empty() && self.partition.is_empty()
    }
}
