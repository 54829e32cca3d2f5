use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use crate::error::LockError;

/// Which side of the lock a handle holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared: block additions and pinning.
    Read,
    /// Exclusive: removal and garbage collection.
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Counters describing lock activity since creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockStats {
    pub reads_acquired: u64,
    pub writes_acquired: u64,
    pub releases: u64,
}

impl LockStats {
    /// Acquisitions not yet released.
    ///
    /// The counters are sampled one at a time, so a snapshot taken during
    /// concurrent activity may show more releases than acquisitions.
    pub fn outstanding(&self) -> u64 {
        (self.reads_acquired + self.writes_acquired).saturating_sub(self.releases)
    }
}

#[derive(Debug, Default)]
struct Counters {
    reads_acquired: AtomicU64,
    writes_acquired: AtomicU64,
    releases: AtomicU64,
}

/// The node's garbage-collection lock.
///
/// A readers/writer lock coordinating classes of block mutation. Adding and
/// pinning take the read side and may run concurrently with each other;
/// removal and GC take the write side and exclude everything else.
///
/// Queuing is FIFO: once a writer is waiting, readers that arrive after it
/// wait too, so a continuous stream of readers cannot starve removal.
///
/// Clones share the same underlying lock. A node creates one `GcLock` and
/// hands clones to every component that mutates the block store.
#[derive(Clone, Default)]
pub struct GcLock {
    inner: Arc<RwLock<()>>,
    counters: Arc<Counters>,
}

impl GcLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the shared side, suspending until no writer holds or awaits it.
    pub async fn read_lock(&self) -> LockHandle {
        let guard = Arc::clone(&self.inner).read_owned().await;
        self.grant(Guard::Read(guard))
    }

    /// Acquire the exclusive side, suspending until every holder has released.
    pub async fn write_lock(&self) -> LockHandle {
        let guard = Arc::clone(&self.inner).write_owned().await;
        self.grant(Guard::Write(guard))
    }

    /// Like [`read_lock`](Self::read_lock), giving up after `timeout`.
    pub async fn read_lock_timeout(&self, timeout: Duration) -> Result<LockHandle, LockError> {
        let guard = tokio::time::timeout(timeout, Arc::clone(&self.inner).read_owned())
            .await
            .map_err(|_| LockError::Timeout {
                mode: LockMode::Read,
                waited: timeout,
            })?;
        Ok(self.grant(Guard::Read(guard)))
    }

    /// Like [`write_lock`](Self::write_lock), giving up after `timeout`.
    pub async fn write_lock_timeout(&self, timeout: Duration) -> Result<LockHandle, LockError> {
        let guard = tokio::time::timeout(timeout, Arc::clone(&self.inner).write_owned())
            .await
            .map_err(|_| LockError::Timeout {
                mode: LockMode::Write,
                waited: timeout,
            })?;
        Ok(self.grant(Guard::Write(guard)))
    }

    /// Take the exclusive side only if it is free right now.
    pub fn try_write_lock(&self) -> Result<LockHandle, LockError> {
        let guard = Arc::clone(&self.inner)
            .try_write_owned()
            .map_err(|_| LockError::WouldBlock(LockMode::Write))?;
        Ok(self.grant(Guard::Write(guard)))
    }

    /// Take the shared side only if it is free right now.
    pub fn try_read_lock(&self) -> Result<LockHandle, LockError> {
        let guard = Arc::clone(&self.inner)
            .try_read_owned()
            .map_err(|_| LockError::WouldBlock(LockMode::Read))?;
        Ok(self.grant(Guard::Read(guard)))
    }

    /// Returns `true` while any handle (read or write) is outstanding.
    pub fn is_locked(&self) -> bool {
        self.inner.try_write().is_err()
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            reads_acquired: self.counters.reads_acquired.load(Ordering::SeqCst),
            writes_acquired: self.counters.writes_acquired.load(Ordering::SeqCst),
            releases: self.counters.releases.load(Ordering::SeqCst),
        }
    }

    fn grant(&self, guard: Guard) -> LockHandle {
        let mode = guard.mode();
        let counter = match mode {
            LockMode::Read => &self.counters.reads_acquired,
            LockMode::Write => &self.counters.writes_acquired,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        debug!(%mode, "gc lock acquired");
        LockHandle {
            mode,
            held: Some(Arc::new(Held {
                _guard: guard,
                mode,
                acquired_at: Instant::now(),
                counters: Arc::clone(&self.counters),
            })),
        }
    }
}

impl fmt::Debug for GcLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcLock")
            .field("locked", &self.is_locked())
            .field("stats", &self.stats())
            .finish()
    }
}

enum Guard {
    Read(OwnedRwLockReadGuard<()>),
    Write(OwnedRwLockWriteGuard<()>),
}

impl Guard {
    fn mode(&self) -> LockMode {
        match self {
            Self::Read(_) => LockMode::Read,
            Self::Write(_) => LockMode::Write,
        }
    }
}

/// One acquisition. Dropping it releases the lock.
struct Held {
    _guard: Guard,
    mode: LockMode,
    acquired_at: Instant,
    counters: Arc<Counters>,
}

impl Drop for Held {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        debug!(
            mode = %self.mode,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "gc lock released"
        );
    }
}

/// Capability proving the holder owns one side of a [`GcLock`].
///
/// The lock is released when the handle is dropped or
/// [`release`](Self::release) is called, whichever comes first; releasing
/// twice is a no-op. Clones share a single acquisition, which is released
/// when the last clone goes away. This lets work spawned under the lock keep
/// it held until that work settles.
#[derive(Clone)]
pub struct LockHandle {
    mode: LockMode,
    held: Option<Arc<Held>>,
}

impl LockHandle {
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Returns `true` until this handle has been released.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Give up this handle's share of the acquisition.
    pub fn release(&mut self) {
        self.held.take();
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("mode", &self.mode)
            .field("held", &self.is_held())
            .finish()
    }
}
