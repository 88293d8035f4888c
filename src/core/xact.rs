//! Per-transaction frames of deferred invalidations.

use tracing::debug;

use crate::ListHeader;
use crate::TransactionStateError;

/// Observable state of an [`InvalidationStack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XactState {
    NoTransaction,
    TopLevel,
    /// A top-level transaction with `k` open subtransactions
    Nested(usize),
}

/// Deferred invalidations of one transaction or subtransaction.
///
/// `current_cmd` collects what the running command registers. At every
/// command boundary it is applied locally and moved into `prior_cmds`, which
/// therefore holds everything already visible to this backend.
#[derive(Debug)]
pub struct TransInvalFrame {
    /// Nesting level; 1 is the top-level transaction
    pub level: u32,
    pub current_cmd: ListHeader,
    pub prior_cmds: ListHeader,
    /// The relcache init file must be removed when this transaction commits
    pub relcache_init_file_inval: bool,
}

impl TransInvalFrame {
    fn new(
        level: u32,
        first_chunk_size: usize,
    ) -> Self {
        Self {
            level,
            current_cmd: ListHeader::new(first_chunk_size),
            prior_cmds: ListHeader::new(first_chunk_size),
            relcache_init_file_inval: false,
        }
    }
}

/// Vec-backed stack of frames. The innermost frame is the last element; its
/// parent is the one before it.
#[derive(Debug)]
pub struct InvalidationStack {
    frames: Vec<TransInvalFrame>,
    first_chunk_size: usize,
}

impl InvalidationStack {
    pub fn new(first_chunk_size: usize) -> Self {
        Self {
            frames: Vec::new(),
            first_chunk_size,
        }
    }

    pub fn state(&self) -> XactState {
        match self.frames.len() {
            0 => XactState::NoTransaction,
            1 => XactState::TopLevel,
            n => XactState::Nested(n - 1),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Opens the top-level frame
    pub fn push_top(&mut self) -> Result<(), TransactionStateError> {
        if let Some(frame) = self.frames.last() {
            return Err(TransactionStateError::AlreadyInTransaction { level: frame.level });
        }
        self.frames.push(TransInvalFrame::new(1, self.first_chunk_size));
        debug!("opened top-level invalidation frame");
        Ok(())
    }

    /// Opens a subtransaction frame on top of the innermost one
    pub fn push_sub(&mut self) -> Result<u32, TransactionStateError> {
        let level = match self.frames.last() {
            Some(frame) => frame.level + 1,
            None => return Err(TransactionStateError::NoActiveTransaction),
        };
        self.frames.push(TransInvalFrame::new(level, self.first_chunk_size));
        debug!("opened invalidation frame at level {}", level);
        Ok(level)
    }

    /// Removes the innermost frame
    pub fn pop(&mut self) -> Option<TransInvalFrame> {
        let frame = self.frames.pop();
        if let Some(ref f) = frame {
            debug!("closed invalidation frame at level {}", f.level);
        }
        frame
    }

    pub fn innermost(&self) -> Option<&TransInvalFrame> {
        self.frames.last()
    }

    pub fn innermost_mut(&mut self) -> Option<&mut TransInvalFrame> {
        self.frames.last_mut()
    }

    /// Frame that receives newly registered invalidations
    pub fn current_frame_mut(&mut self) -> Result<&mut TransInvalFrame, TransactionStateError> {
        self.frames
            .last_mut()
            .ok_or(TransactionStateError::NoActiveTransaction)
    }

    /// Pops a subtransaction frame and merges it into its parent: the
    /// child's prior commands are appended to the parent's and a pending
    /// init-file invalidation carries over.
    ///
    /// The child's `current_cmd` must already be empty.
    pub fn merge_into_parent(&mut self) -> Result<(), TransactionStateError> {
        if self.frames.len() < 2 {
            return Err(TransactionStateError::NotInSubtransaction);
        }
        let mut child = match self.frames.pop() {
            Some(frame) => frame,
            None => return Err(TransactionStateError::NoActiveTransaction),
        };
        debug_assert!(child.current_cmd.is_empty());

        if let Some(parent) = self.frames.last_mut() {
            parent.prior_cmds.append(&mut child.prior_cmds);
            parent.relcache_init_file_inval |= child.relcache_init_file_inval;
            debug!(
                "merged level {} into level {} ({} messages)",
                child.level,
                parent.level,
                parent.prior_cmds.len()
            );
        }
        Ok(())
    }
}
