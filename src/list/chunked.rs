use crate::constants::FIRST_CHUNK_SIZE;
use crate::InvalidationMessage;

#[derive(Debug, Clone)]
struct Chunk {
    items: Vec<InvalidationMessage>,
    max_items: usize,
}

impl Chunk {
    fn with_capacity(max_items: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_items),
            max_items,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.max_items
    }
}

/// Append-only list of messages stored in chunks.
///
/// The first chunk holds `first_chunk_size` messages and every new chunk
/// doubles the capacity of the newest one. Nothing is ever removed: a list is
/// cleared by moving its chunks into another list or by dropping it.
#[derive(Debug, Clone)]
pub struct ChunkedList {
    chunks: Vec<Chunk>,
    first_chunk_size: usize,
}

impl Default for ChunkedList {
    fn default() -> Self {
        Self::new(FIRST_CHUNK_SIZE)
    }
}

impl ChunkedList {
    pub fn new(first_chunk_size: usize) -> Self {
        Self {
            chunks: Vec::new(),
            first_chunk_size: first_chunk_size.max(1),
        }
    }

    /// O(1) amortized
    pub fn push(
        &mut self,
        msg: InvalidationMessage,
    ) {
        let next_size = match self.chunks.last() {
            None => Some(self.first_chunk_size),
            Some(chunk) if chunk.is_full() => Some(chunk.max_items * 2),
            Some(_) => None,
        };
        if let Some(size) = next_size {
            self.chunks.push(Chunk::with_capacity(size));
        }

        if let Some(chunk) = self.chunks.last_mut() {
            chunk.items.push(msg);
        }
    }

    /// Moves every chunk of `src` into this list, leaving `src` empty.
    ///
    /// Cost is proportional to the number of chunks, not messages.
    pub fn append(
        &mut self,
        src: &mut ChunkedList,
    ) {
        if src.chunks.is_empty() {
            return;
        }
        self.chunks.append(&mut src.chunks);
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvalidationMessage> + '_ {
        self.chunks.iter().flat_map(|chunk| chunk.items.iter())
    }

    /// Visits the messages one chunk at a time
    pub fn batches(&self) -> impl Iterator<Item = &[InvalidationMessage]> + '_ {
        self.chunks
            .iter()
            .filter(|chunk| !chunk.items.is_empty())
            .map(|chunk| chunk.items.as_slice())
    }

    pub fn contains_where<F>(
        &self,
        predicate: F,
    ) -> bool
    where
        F: FnMut(&InvalidationMessage) -> bool,
    {
        self.iter().any(predicate)
    }

    pub fn len(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|chunk| chunk.items.is_empty())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Capacities of the chunks in allocation order
    pub fn chunk_capacities(&self) -> Vec<usize> {
        self.chunks.iter().map(|chunk| chunk.max_items).collect()
    }
}
