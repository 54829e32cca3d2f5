//! Error types for pin operations.

use blox_types::ContentId;
use thiserror::Error;

use crate::types::PinKind;

/// Errors that can occur while querying or mutating the pin set.
#[derive(Debug, Error)]
pub enum PinError {
    /// The block already carries a stronger pin.
    #[error("{id} is already pinned {kind}")]
    AlreadyPinned { id: ContentId, kind: PinKind },

    /// Pins of this kind are derived, never added directly.
    #[error("cannot add an {0} pin directly")]
    NotPinnable(PinKind),

    /// Unknown pin kind name.
    #[error("unknown pin type: {0}")]
    UnknownKind(String),

    /// The pin set could not be consulted.
    #[error("pin lookup failed: {0}")]
    Lookup(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while loading or saving the pin set.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for pin operations.
pub type PinResult<T> = std::result::Result<T, PinError>;
