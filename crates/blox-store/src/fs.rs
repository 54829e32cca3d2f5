use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use blox_types::{ContentId, HashAlgorithm};
use tokio::fs;
use tracing::debug;

use crate::block::Block;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

const BLOCK_EXT: &str = "data";

/// Flat-file block store: one file per block.
///
/// Blocks live under `<root>/<shard>/<id>.data`, where `<shard>` is the
/// first two hex digits of the digest. Each write goes to its own temporary
/// file in the shard directory and is renamed into place, so a block file is
/// either absent or complete, even when several writers store the same block.
#[derive(Debug, Clone)]
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shard_dir(&self, id: &ContentId) -> PathBuf {
        self.root.join(hex::encode(&id.digest()[..1]))
    }

    fn block_path(&self, id: &ContentId) -> PathBuf {
        self.shard_dir(id).join(format!("{id}.{BLOCK_EXT}"))
    }
}

#[async_trait]
impl BlockStore for FsBlockStore {
    async fn put(&self, block: Block) -> StoreResult<ContentId> {
        let id = *block.id();
        let path = self.block_path(&id);
        if fs::try_exists(&path).await? {
            return Ok(id);
        }
        let shard = self.shard_dir(&id);
        fs::create_dir_all(&shard).await?;
        let size = block.size();
        let data = block.into_data();
        tokio::task::spawn_blocking(move || write_atomic(&shard, &path, &data))
            .await
            .map_err(io::Error::other)??;
        debug!(id = %id.short(), size, "block written");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Option<Block>> {
        match fs::read(self.block_path(id)).await {
            Ok(data) => {
                let block = Block::with_id(*id, data);
                if id.hash_algorithm() == HashAlgorithm::Blake3 && !block.verify() {
                    return Err(StoreError::HashMismatch(*id));
                }
                Ok(Some(block))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn has(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(fs::try_exists(self.block_path(id)).await?)
    }

    async fn delete(&self, id: &ContentId) -> StoreResult<()> {
        fs::remove_file(self.block_path(id)).await?;
        debug!(id = %id.short(), "block deleted");
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<ContentId>> {
        let suffix = format!(".{BLOCK_EXT}");
        let mut ids = Vec::new();
        let mut shards = fs::read_dir(&self.root).await?;
        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }
            let mut entries = fs::read_dir(shard.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(suffix.as_str())) else {
                    continue;
                };
                if let Ok(id) = ContentId::from_text(stem) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Write `data` to a fresh temporary file in `dir` and rename it to `path`.
///
/// Losing a rename race to another writer of the same block is not an error:
/// the contents are identical.
fn write_atomic(dir: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(_) if path.exists() => Ok(()),
        Err(e) => Err(e.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_types::BlockFormat;

    async fn temp_store() -> (tempfile::TempDir, FsBlockStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path().join("blocks")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (_dir, store) = temp_store().await;
        let block = Block::new(BlockFormat::Raw, b"on disk".to_vec());
        let id = store.put(block.clone()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(block));
        assert!(store.block_path(&id).exists());
    }

    #[tokio::test]
    async fn delete_missing_is_io_error() {
        let (_dir, store) = temp_store().await;
        let id = ContentId::compute(BlockFormat::Raw, b"never written");
        assert!(!store.has(&id).await.unwrap());
        let err = store.delete(&id).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let (_dir, store) = temp_store().await;
        let id = store
            .put(Block::new(BlockFormat::DagCbor, b"gone".to_vec()))
            .await
            .unwrap();
        store.delete(&id).await.unwrap();
        assert!(!store.has(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_skips_temp_files() {
        let (_dir, store) = temp_store().await;
        let a = store.put(Block::new(BlockFormat::Raw, b"a".to_vec())).await.unwrap();
        let b = store.put(Block::new(BlockFormat::Raw, b"b".to_vec())).await.unwrap();
        std::fs::write(store.shard_dir(&a).join(".junk.tmp"), b"x").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&a));
        assert!(listed.contains(&b));
    }

    #[tokio::test]
    async fn corrupt_file_is_detected() {
        let (_dir, store) = temp_store().await;
        let id = store.put(Block::new(BlockFormat::Raw, b"good".to_vec())).await.unwrap();
        std::fs::write(store.block_path(&id), b"bad").unwrap();
        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::HashMismatch(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_of_one_block_all_succeed() {
        let (_dir, store) = temp_store().await;
        for round in 0..20u8 {
            let data = vec![round; 4096];
            let writers: Vec<_> = (0..16)
                .map(|_| {
                    let store = store.clone();
                    let block = Block::new(BlockFormat::Raw, data.clone());
                    tokio::spawn(async move { store.put(block).await })
                })
                .collect();
            let mut ids = Vec::new();
            for writer in writers {
                ids.push(writer.await.unwrap().unwrap());
            }
            assert!(ids.windows(2).all(|w| w[0] == w[1]));
            assert_eq!(store.get(&ids[0]).await.unwrap().unwrap().data(), &data[..]);
        }
        assert_eq!(store.list().await.unwrap().len(), 20);
        for shard in std::fs::read_dir(store.root()).unwrap() {
            for entry in std::fs::read_dir(shard.unwrap().path()).unwrap() {
                let name = entry.unwrap().file_name();
                assert!(!name.to_string_lossy().ends_with(".tmp"), "leftover {name:?}");
            }
        }
    }

    #[tokio::test]
    async fn reopen_sees_existing_blocks() {
        let (dir, store) = temp_store().await;
        let id = store.put(Block::new(BlockFormat::Raw, b"persist".to_vec())).await.unwrap();
        drop(store);
        let reopened = FsBlockStore::open(dir.path().join("blocks")).await.unwrap();
        assert!(reopened.has(&id).await.unwrap());
    }
}
