//! Per-identifier results of a removal batch.

use std::fmt;

use blox_pin::{PinError, PinReason};
use blox_store::StoreError;
use blox_types::ContentId;
use serde::Serialize;

/// Options for a removal batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Report every identifier as removed, hiding per-item failures.
    pub force: bool,
    /// Emit no outcomes at all. Blocks are still removed.
    pub quiet: bool,
}

impl RmOptions {
    pub fn force() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }
}

/// Why one block could not be removed.
#[derive(Debug)]
pub enum RemovalFailure {
    /// The block is protected by a pin.
    Pinned(Option<PinReason>),
    /// The block is not in the local store.
    NotFound,
    /// The pin set could not be consulted.
    PinLookup(PinError),
    /// The store failed while checking or deleting the block.
    Store(StoreError),
    /// The task processing the block died.
    Aborted(String),
}

impl fmt::Display for RemovalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pinned(Some(PinReason::Indirect { ancestor })) => {
                write!(f, "pinned via {ancestor}")
            }
            Self::Pinned(Some(reason)) => write!(f, "pinned: {reason}"),
            Self::Pinned(None) => f.write_str("pinned"),
            Self::NotFound => f.write_str("block not found"),
            Self::PinLookup(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Aborted(msg) => write!(f, "removal task aborted: {msg}"),
        }
    }
}

/// A failed removal, tied to the identifier it concerns.
#[derive(Debug)]
pub struct ItemFailure {
    pub id: ContentId,
    pub failure: RemovalFailure,
}

impl ItemFailure {
    pub fn new(id: ContentId, failure: RemovalFailure) -> Self {
        Self { id, failure }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot remove {}: {}", self.id, self.failure)
    }
}

impl std::error::Error for ItemFailure {}

/// Result of processing one identifier: the removed id, or why it stayed.
pub type ItemResult = Result<ContentId, ItemFailure>;

/// What a removal batch reports for one identifier.
///
/// No `error` means the block was removed (or `force` was set).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    pub id: ContentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemovalOutcome {
    pub fn removed(id: ContentId) -> Self {
        Self { id, error: None }
    }

    /// Turn an item result into a report. With `force`, failures are
    /// reported as bare records without an error.
    pub fn report(result: ItemResult, force: bool) -> Self {
        match result {
            Ok(id) => Self::removed(id),
            Err(failure) => Self {
                id: failure.id,
                error: (!force).then(|| failure.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_types::BlockFormat;

    fn cid(seed: &[u8]) -> ContentId {
        ContentId::compute(BlockFormat::Raw, seed)
    }

    #[test]
    fn failure_messages() {
        let id = cid(b"a");
        let root = cid(b"root");
        let cases = [
            (RemovalFailure::Pinned(Some(PinReason::Direct)), "pinned: direct".to_string()),
            (RemovalFailure::Pinned(Some(PinReason::Recursive)), "pinned: recursive".to_string()),
            (
                RemovalFailure::Pinned(Some(PinReason::Indirect { ancestor: root })),
                format!("pinned via {root}"),
            ),
            (RemovalFailure::NotFound, "block not found".to_string()),
        ];
        for (failure, expected) in cases {
            let item = ItemFailure::new(id, failure);
            assert_eq!(item.to_string(), format!("cannot remove {id}: {expected}"));
        }
    }

    #[test]
    fn store_cause_is_included() {
        let id = cid(b"io");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let item = ItemFailure::new(id, RemovalFailure::Store(StoreError::Io(io)));
        assert_eq!(
            item.to_string(),
            format!("cannot remove {id}: I/O error: disk on fire")
        );
    }

    #[test]
    fn force_hides_errors() {
        let id = cid(b"f");
        let failed = || Err(ItemFailure::new(id, RemovalFailure::NotFound));
        assert_eq!(RemovalOutcome::report(failed(), true), RemovalOutcome::removed(id));
        let reported = RemovalOutcome::report(failed(), false);
        assert!(!reported.is_ok());
        assert!(reported.error.unwrap().contains("block not found"));
    }

    #[test]
    fn json_omits_missing_error() {
        let id = cid(b"j");
        let json = serde_json::to_value(RemovalOutcome::removed(id)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": id.to_string() }));
    }
}
