//! The [`PinOracle`] trait: the read-only query contract the removal
//! pipeline relies on.

use async_trait::async_trait;
use blox_types::ContentId;

use crate::error::PinResult;
use crate::types::{PinKind, PinQueryScope, PinStatus};

/// Answers whether a block is protected by a pin, and why.
///
/// Queries have no side effects. Implementations must be thread-safe; a
/// failed lookup is reported as an error rather than as "unpinned".
#[async_trait]
pub trait PinOracle: Send + Sync {
    /// Check `id` against the pin kinds in `scope`.
    async fn is_pinned_with_type(
        &self,
        id: &ContentId,
        scope: PinQueryScope,
    ) -> PinResult<PinStatus>;

    /// Check `id` against every pin kind.
    async fn is_pinned(&self, id: &ContentId) -> PinResult<PinStatus> {
        self.is_pinned_with_type(id, PinQueryScope::ALL).await
    }
}

/// A pin set that can also be changed.
///
/// Callers must hold the read side of the node's GC lock while mutating, so
/// that pin changes never interleave with a removal batch.
#[async_trait]
pub trait PinWriter: PinOracle {
    /// Add a pin of `kind` on `id`. `descendants` is only meaningful for
    /// recursive pins. Indirect pins cannot be added directly.
    async fn add_pin(
        &self,
        id: ContentId,
        kind: PinKind,
        descendants: Vec<ContentId>,
    ) -> PinResult<()>;

    /// Remove a direct or recursive pin. Returns `true` if one was removed.
    async fn remove_pin(&self, id: &ContentId) -> PinResult<bool>;

    /// All pins of the kinds in `scope`.
    async fn list_pins(&self, scope: PinQueryScope) -> PinResult<Vec<(ContentId, PinKind)>>;
}
