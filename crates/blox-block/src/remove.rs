//! The removal pipeline.
//!
//! A batch runs entirely under the write side of the GC lock, so no block
//! can be added or pinned between the moment its protection is checked and
//! the moment it is deleted.
//!
//! Identifiers are decoded one at a time as they are dispatched and each
//! dispatched identifier runs as its own task. At most `concurrency` tasks
//! are outstanding; outcomes are yielded in input order. Every task holds a
//! clone of the lock handle, so if the consumer drops the stream early, no
//! new identifiers start but those already running finish, and the lock is
//! released once the last of them settles.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::stream;
use blox_lock::{GcLock, LockHandle};
use blox_pin::{PinOracle, PinQueryScope};
use blox_store::BlockStore;
use blox_types::{CidInput, ContentId};
use futures::stream::{BoxStream, FuturesOrdered, StreamExt};
use tracing::{debug, info, warn};

use crate::error::RemovalError;
use crate::outcome::{ItemFailure, ItemResult, RemovalFailure, RemovalOutcome, RmOptions};

/// Lazily produced outcomes of a removal batch.
///
/// Yields one `Ok` per identifier (none in quiet mode). A batch-fatal error
/// is yielded last, after the lock has been released.
pub type RemovalStream = BoxStream<'static, Result<RemovalOutcome, RemovalError>>;

/// Everything a removal batch needs, detached from the service that made it.
#[derive(Clone)]
pub(crate) struct Remover {
    pub store: Arc<dyn BlockStore>,
    pub pins: Arc<dyn PinOracle>,
    pub lock: GcLock,
    pub concurrency: usize,
    pub lock_timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct BatchSummary {
    removed: usize,
    failed: usize,
}

impl Remover {
    pub fn run(self, targets: Vec<CidInput>, options: RmOptions) -> RemovalStream {
        let concurrency = self.concurrency.max(1);
        let total = targets.len();

        let outcomes = stream! {
            match self.acquire().await {
                Err(e) => {
                    warn!(error = %e, "removal batch could not take the gc lock");
                    yield Err(e);
                }
                Ok(handle) => {
                    let started = Instant::now();
                    let mut targets = targets.into_iter().enumerate();
                    let mut in_flight = FuturesOrdered::new();
                    let mut fatal: Option<RemovalError> = None;
                    let mut summary = BatchSummary::default();

                    loop {
                        while fatal.is_none() && in_flight.len() < concurrency {
                            let Some((position, target)) = targets.next() else {
                                break;
                            };
                            match target.normalize() {
                                Ok(id) => in_flight.push_back(self.dispatch(id, handle.clone())),
                                Err(source) => {
                                    warn!(position, error = %source, "invalid identifier, aborting removal batch");
                                    fatal = Some(RemovalError::InvalidIdentifier { position, source });
                                }
                            }
                        }

                        let Some(result) = in_flight.next().await else {
                            break;
                        };
                        match &result {
                            Ok(_) => summary.removed += 1,
                            Err(_) => summary.failed += 1,
                        }
                        if !options.quiet {
                            yield Ok(RemovalOutcome::report(result, options.force));
                        }
                    }

                    drop(handle);
                    info!(
                        total,
                        removed = summary.removed,
                        failed = summary.failed,
                        aborted = fatal.is_some(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "removal batch finished"
                    );
                    if let Some(e) = fatal {
                        yield Err(e);
                    }
                }
            }
        };
        outcomes.boxed()
    }

    async fn acquire(&self) -> Result<LockHandle, RemovalError> {
        match self.lock_timeout {
            Some(timeout) => Ok(self.lock.write_lock_timeout(timeout).await?),
            None => Ok(self.lock.write_lock().await),
        }
    }

    /// Run one removal on its own task. The task keeps `lock` alive until it
    /// finishes, even if the batch that started it has been dropped.
    fn dispatch(&self, id: ContentId, lock: LockHandle) -> impl Future<Output = ItemResult> {
        let task = tokio::spawn(remove_one(
            Arc::clone(&self.store),
            Arc::clone(&self.pins),
            id,
            lock,
        ));
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ItemFailure::new(id, RemovalFailure::Aborted(e.to_string()))),
            }
        }
    }
}

/// Check protection, then existence, then delete.
async fn remove_one(
    store: Arc<dyn BlockStore>,
    pins: Arc<dyn PinOracle>,
    id: ContentId,
    _lock: LockHandle,
) -> ItemResult {
    let fail = |failure: RemovalFailure| {
        debug!(id = %id.short(), %failure, "block not removed");
        ItemFailure::new(id, failure)
    };

    let status = pins
        .is_pinned_with_type(&id, PinQueryScope::ALL)
        .await
        .map_err(|e| fail(RemovalFailure::PinLookup(e)))?;
    if status.pinned {
        return Err(fail(RemovalFailure::Pinned(status.reason)));
    }

    let present = store
        .has(&id)
        .await
        .map_err(|e| fail(RemovalFailure::Store(e)))?;
    if !present {
        return Err(fail(RemovalFailure::NotFound));
    }

    store
        .delete(&id)
        .await
        .map_err(|e| fail(RemovalFailure::Store(e)))?;
    debug!(id = %id.short(), "block removed");
    Ok(id)
}
