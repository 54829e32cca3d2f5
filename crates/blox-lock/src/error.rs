use std::time::Duration;

use thiserror::Error;

use crate::lock::LockMode;

/// Errors from acquiring the GC lock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock was not granted within the allowed time.
    #[error("timed out after {waited:?} waiting for the {mode} lock")]
    Timeout { mode: LockMode, waited: Duration },

    /// A non-blocking acquisition found the lock taken.
    #[error("{0} lock is not available")]
    WouldBlock(LockMode),
}
