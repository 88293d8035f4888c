#[cfg(test)]
use mockall::automock;

use crate::Oid;
use crate::Result;

/// The persisted snapshot of preloaded relation descriptors.
///
/// When a committing transaction invalidated a relation stored in the file,
/// the file is removed before the broadcast and the removal is finished after
/// it, so no backend can reload the stale snapshot in between.
#[cfg_attr(test, automock)]
pub trait RelcacheInitFile: Send + 'static {
    /// Whether the descriptor of `relation_id` is stored in the file
    fn contains(
        &self,
        relation_id: Oid,
    ) -> bool;

    fn pre_invalidate(&mut self) -> Result<()>;

    fn post_invalidate(&mut self) -> Result<()>;
}

/// For deployments without an init file
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInitFile;

impl RelcacheInitFile for NoInitFile {
    fn contains(
        &self,
        _relation_id: Oid,
    ) -> bool {
        false
    }

    fn pre_invalidate(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_invalidate(&mut self) -> Result<()> {
        Ok(())
    }
}
