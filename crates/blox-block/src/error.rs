use blox_lock::LockError;
use blox_pin::PinError;
use blox_store::StoreError;
use blox_types::{ContentId, TypeError};

/// Errors from block service operations.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// An identifier could not be decoded.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] TypeError),

    /// The GC lock could not be acquired.
    #[error("lock acquisition failed: {0}")]
    Lock(#[from] LockError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("pin error: {0}")]
    Pin(#[from] PinError),

    /// The block is not in the local store.
    #[error("block not found: {0}")]
    NotFound(ContentId),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for block service operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors that end a removal batch.
///
/// Per-identifier failures (pinned, absent, I/O) never show up here; they
/// are reported inside each [`RemovalOutcome`](crate::RemovalOutcome).
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RemovalError {
    /// The identifier at `position` could not be decoded. Identifiers after
    /// it were never processed.
    #[error("invalid identifier at position {position}: {source}")]
    InvalidIdentifier { position: usize, source: TypeError },

    /// The GC lock could not be acquired; nothing was processed.
    #[error("lock acquisition failed: {0}")]
    Lock(#[from] LockError),
}
