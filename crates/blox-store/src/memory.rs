use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use blox_types::ContentId;

use crate::block::Block;
use crate::error::StoreResult;
use crate::traits::BlockStore;

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on read.
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl InMemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }

    /// Synchronous existence check, for assertions outside an async context.
    pub fn contains(&self, id: &ContentId) -> bool {
        self.blocks.read().expect("lock poisoned").contains_key(id)
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn put(&self, block: Block) -> StoreResult<ContentId> {
        let id = *block.id();
        let mut map = self.blocks.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| block.into_data());
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Option<Block>> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.get(id).map(|data| Block::with_id(*id, data.clone())))
    }

    async fn has(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.contains(id))
    }

    async fn delete(&self, id: &ContentId) -> StoreResult<()> {
        self.blocks.write().expect("lock poisoned").remove(id);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<ContentId>> {
        let map = self.blocks.read().expect("lock poisoned");
        let mut ids: Vec<ContentId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlockStore")
            .field("block_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_types::BlockFormat;

    fn raw(content: &[u8]) -> Block {
        Block::new(BlockFormat::Raw, content.to_vec())
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryBlockStore::new();
        let block = raw(b"hello world");
        let id = store.put(block.clone()).await.unwrap();
        let read_back = store.get(&id).await.unwrap().expect("should exist");
        assert_eq!(read_back, block);
        assert!(read_back.verify());
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let store = InMemoryBlockStore::new();
        let a = store.put(raw(b"same")).await.unwrap();
        let b = store.put(raw(b"same")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn has_and_delete() {
        let store = InMemoryBlockStore::new();
        let id = store.put(raw(b"to-delete")).await.unwrap();
        assert!(store.has(&id).await.unwrap());
        store.delete(&id).await.unwrap();
        assert!(!store.has(&id).await.unwrap());
        // Deleting again is not an error.
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryBlockStore::new();
        let id = ContentId::compute(BlockFormat::Raw, b"missing");
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store = InMemoryBlockStore::new();
        let ids = store
            .put_many(vec![raw(b"a"), raw(b"b"), raw(b"c")])
            .await
            .unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        for w in listed.windows(2) {
            assert!(w[0] <= w[1]);
        }
        for id in ids {
            assert!(listed.contains(&id));
        }
    }

    #[tokio::test]
    async fn len_counts_distinct_blocks() {
        let store = InMemoryBlockStore::default();
        assert!(store.is_empty());
        store.put(raw(b"12345")).await.unwrap();
        store.put(raw(b"12345")).await.unwrap();
        store.put(raw(b"123456789")).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlockStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("block_count"));
    }
}
