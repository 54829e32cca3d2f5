use std::sync::Arc;

use blox_lock::{GcLock, LockHandle};
use blox_pin::{PinKind, PinOracle, PinQueryScope, PinWriter};
use blox_store::{Block, BlockStore};
use blox_types::{BlockFormat, CidInput, ContentId};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BlockConfig;
use crate::error::{BlockError, BlockResult};
use crate::outcome::RmOptions;
use crate::remove::{RemovalStream, Remover};

/// Size information about a stored block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockStat {
    pub id: ContentId,
    pub size: u64,
}

/// Block operations of a node, coordinated through one [`GcLock`].
///
/// `put` takes the read side of the lock, so additions run concurrently
/// with each other. `rm` takes the write side for the whole batch, so a
/// removal never overlaps an addition or a pin change.
pub struct BlockService {
    store: Arc<dyn BlockStore>,
    pins: Arc<dyn PinOracle>,
    lock: GcLock,
    config: BlockConfig,
}

impl BlockService {
    pub fn new(
        store: Arc<dyn BlockStore>,
        pins: Arc<dyn PinOracle>,
        lock: GcLock,
        config: BlockConfig,
    ) -> BlockResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            pins,
            lock,
            config,
        })
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn lock(&self) -> &GcLock {
        &self.lock
    }

    /// Store `data` as a block of `format` and return its identifier.
    pub async fn put(&self, data: Vec<u8>, format: BlockFormat) -> BlockResult<ContentId> {
        let _lock = read_lock(&self.lock, &self.config).await?;
        let block = Block::new(format, data);
        let size = block.size();
        let id = self.store.put(block).await?;
        info!(id = %id.short(), size, "block added");
        Ok(id)
    }

    /// Size of a stored block. No lock is taken.
    pub async fn stat(&self, target: impl Into<CidInput>) -> BlockResult<BlockStat> {
        let id = target.into().normalize()?;
        let block = self.store.get(&id).await?.ok_or(BlockError::NotFound(id))?;
        Ok(BlockStat {
            id,
            size: block.size(),
        })
    }

    /// Read a block's payload. No lock is taken.
    pub async fn get(&self, target: impl Into<CidInput>) -> BlockResult<Vec<u8>> {
        let id = target.into().normalize()?;
        let block = self.store.get(&id).await?.ok_or(BlockError::NotFound(id))?;
        Ok(block.into_data())
    }

    /// Remove a batch of blocks.
    ///
    /// Nothing happens until the returned stream is polled. The GC lock is
    /// taken in write mode on first poll and released once the batch ends,
    /// fails, or is dropped and its in-flight removals have settled.
    pub fn rm<I, T>(&self, targets: I, options: RmOptions) -> RemovalStream
    where
        I: IntoIterator<Item = T>,
        T: Into<CidInput>,
    {
        let targets: Vec<CidInput> = targets.into_iter().map(Into::into).collect();
        debug!(count = targets.len(), ?options, "removal batch requested");
        self.remover().run(targets, options)
    }

    /// Remove a single block.
    pub fn rm_one(&self, target: impl Into<CidInput>, options: RmOptions) -> RemovalStream {
        self.rm(std::iter::once(target.into()), options)
    }

    fn remover(&self) -> Remover {
        Remover {
            store: Arc::clone(&self.store),
            pins: Arc::clone(&self.pins),
            lock: self.lock.clone(),
            concurrency: self.config.rm_concurrency,
            lock_timeout: self.config.lock_timeout(),
        }
    }
}

/// Pin management for blocks held by a node.
///
/// Pin changes take the read side of the GC lock: they may run alongside
/// block additions but never during a removal batch.
pub struct PinService {
    store: Arc<dyn BlockStore>,
    pins: Arc<dyn PinWriter>,
    lock: GcLock,
    config: BlockConfig,
}

impl PinService {
    pub fn new(
        store: Arc<dyn BlockStore>,
        pins: Arc<dyn PinWriter>,
        lock: GcLock,
        config: BlockConfig,
    ) -> Self {
        Self {
            store,
            pins,
            lock,
            config,
        }
    }

    /// Pin a stored block. `descendants` only matter for recursive pins.
    pub async fn pin(
        &self,
        target: impl Into<CidInput>,
        kind: PinKind,
        descendants: Vec<ContentId>,
    ) -> BlockResult<ContentId> {
        let id = target.into().normalize()?;
        let _lock = read_lock(&self.lock, &self.config).await?;
        if !self.store.has(&id).await? {
            return Err(BlockError::NotFound(id));
        }
        self.pins.add_pin(id, kind, descendants).await?;
        info!(id = %id.short(), %kind, "block pinned");
        Ok(id)
    }

    /// Remove a direct or recursive pin. Returns `true` if one was removed.
    pub async fn unpin(&self, target: impl Into<CidInput>) -> BlockResult<bool> {
        let id = target.into().normalize()?;
        let _lock = read_lock(&self.lock, &self.config).await?;
        let removed = self.pins.remove_pin(&id).await?;
        info!(id = %id.short(), removed, "block unpinned");
        Ok(removed)
    }

    /// All pins of the kinds in `scope`.
    pub async fn list(&self, scope: PinQueryScope) -> BlockResult<Vec<(ContentId, PinKind)>> {
        Ok(self.pins.list_pins(scope).await?)
    }
}

async fn read_lock(lock: &GcLock, config: &BlockConfig) -> BlockResult<LockHandle> {
    match config.lock_timeout() {
        Some(timeout) => Ok(lock.read_lock_timeout(timeout).await?),
        None => Ok(lock.read_lock().await),
    }
}
