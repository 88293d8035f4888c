use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::IncomingEvent;
use super::SharedQueue;
use crate::encode_batch;
use crate::MessageSlot;
use crate::constants::MESSAGE_SLOT_SIZE;
use crate::InvalidationMessage;
use crate::Result;

type ReaderId = u64;

#[derive(Debug)]
struct ReaderState {
    next_pos: u64,
    reset_pending: bool,
}

#[derive(Debug)]
struct QueueInner {
    slots: VecDeque<MessageSlot>,
    /// Position of `slots[0]`
    min_pos: u64,
    readers: HashMap<ReaderId, ReaderState>,
    next_reader_id: ReaderId,
    capacity: usize,
}

impl QueueInner {
    fn max_pos(&self) -> u64 {
        self.min_pos + self.slots.len() as u64
    }
}

/// In-process shared queue with a bounded ring of encoded message slots.
///
/// Every [`MemoryQueueReader`] sees every message broadcast after it
/// subscribed, including its own. A reader that falls more than `capacity`
/// messages behind loses its backlog and receives a single
/// [`IncomingEvent::Reset`] instead.
#[derive(Debug, Clone)]
pub struct MemorySharedQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl MemorySharedQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                slots: VecDeque::new(),
                min_pos: 0,
                readers: HashMap::new(),
                next_reader_id: 0,
                capacity: capacity.max(1),
            })),
        }
    }

    /// Registers a new reader positioned at the current end of the queue
    pub fn subscribe(&self) -> MemoryQueueReader {
        let mut inner = self.inner.lock();
        let id = inner.next_reader_id;
        inner.next_reader_id += 1;
        let next_pos = inner.max_pos();
        inner.readers.insert(
            id,
            ReaderState {
                next_pos,
                reset_pending: false,
            },
        );
        debug!("queue reader {} subscribed at {}", id, next_pos);

        MemoryQueueReader {
            id,
            queue: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().slots.is_empty()
    }

    pub fn reader_count(&self) -> usize {
        self.inner.lock().readers.len()
    }

    fn push(
        &self,
        messages: &[InvalidationMessage],
    ) -> Result<()> {
        let encoded = encode_batch(messages)?;

        let mut inner = self.inner.lock();
        for chunk in encoded.chunks_exact(MESSAGE_SLOT_SIZE) {
            let mut slot = [0u8; MESSAGE_SLOT_SIZE];
            slot.copy_from_slice(chunk);
            inner.slots.push_back(slot);
        }

        while inner.slots.len() > inner.capacity {
            inner.slots.pop_front();
            inner.min_pos += 1;
        }

        let min_pos = inner.min_pos;
        let max_pos = inner.max_pos();
        for (id, reader) in inner.readers.iter_mut() {
            if reader.next_pos < min_pos {
                warn!("queue reader {} overflowed, scheduling reset", id);
                reader.reset_pending = true;
                reader.next_pos = max_pos;
            }
        }
        Ok(())
    }

    fn drain(
        &self,
        reader_id: ReaderId,
    ) -> Result<Vec<IncomingEvent>> {
        let mut inner = self.inner.lock();
        let min_pos = inner.min_pos;
        let max_pos = inner.max_pos();

        let (start, reset) = match inner.readers.get_mut(&reader_id) {
            Some(reader) => {
                let state = (reader.next_pos, reader.reset_pending);
                reader.next_pos = max_pos;
                reader.reset_pending = false;
                state
            }
            None => return Ok(Vec::new()),
        };

        if reset {
            return Ok(vec![IncomingEvent::Reset]);
        }

        inner
            .slots
            .iter()
            .skip((start - min_pos) as usize)
            .map(|slot| InvalidationMessage::decode(slot).map(IncomingEvent::Message))
            .collect()
    }

    fn unsubscribe(
        &self,
        reader_id: ReaderId,
    ) {
        self.inner.lock().readers.remove(&reader_id);
    }
}

/// One backend's handle on a [`MemorySharedQueue`]
#[derive(Debug)]
pub struct MemoryQueueReader {
    id: ReaderId,
    queue: MemorySharedQueue,
}

impl MemoryQueueReader {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl SharedQueue for MemoryQueueReader {
    fn broadcast(
        &self,
        messages: &[InvalidationMessage],
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        self.queue.push(messages)
    }

    fn poll_incoming(&self) -> Result<Vec<IncomingEvent>> {
        self.queue.drain(self.id)
    }
}

impl Drop for MemoryQueueReader {
    fn drop(&mut self) {
        self.queue.unsubscribe(self.id);
    }
}
