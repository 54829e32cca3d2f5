use async_trait::async_trait;
use blox_types::ContentId;

use crate::block::Block;
use crate::error::StoreResult;

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written: the same payload always maps to
///   the same identifier.
/// - `delete` performs no existence check of its own. Callers that need to
///   tell "already absent" from "delete failed" call `has` first.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Write a block. Writing a block that is already present is a no-op.
    async fn put(&self, block: Block) -> StoreResult<ContentId>;

    /// Read a block by identifier. Returns `Ok(None)` if it does not exist.
    async fn get(&self, id: &ContentId) -> StoreResult<Option<Block>>;

    /// Check whether a block exists in the store.
    async fn has(&self, id: &ContentId) -> StoreResult<bool>;

    /// Physically delete a block.
    ///
    /// Intended for garbage collection and removal only, and only while the
    /// caller holds the write side of the node's GC lock.
    async fn delete(&self, id: &ContentId) -> StoreResult<()>;

    /// All identifiers currently stored, sorted.
    async fn list(&self) -> StoreResult<Vec<ContentId>>;

    /// Write several blocks. Backends may override to batch I/O.
    async fn put_many(&self, blocks: Vec<Block>) -> StoreResult<Vec<ContentId>> {
        let mut ids = Vec::with_capacity(blocks.len());
        for block in blocks {
            ids.push(self.put(block).await?);
        }
        Ok(ids)
    }
}
