//! In-memory pin set with optional JSON persistence.
//!
//! [`InMemoryPinSet`] keeps direct, recursive and internal pins behind a
//! `RwLock`. Recursive pins carry the list of descendants they protect; the
//! caller supplies that list when pinning, since walking the DAG is the
//! pinning layer's job and not this store's.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use blox_types::ContentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PinError, PinResult};
use crate::traits::{PinOracle, PinWriter};
use crate::types::{PinKind, PinQueryScope, PinReason, PinStatus};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PinState {
    #[serde(default)]
    direct: BTreeSet<ContentId>,
    /// Recursive roots mapped to the descendants they protect.
    #[serde(default)]
    recursive: BTreeMap<ContentId, BTreeSet<ContentId>>,
    #[serde(default)]
    internal: BTreeSet<ContentId>,
}

/// An in-memory implementation of [`PinOracle`] that also supports mutation.
#[derive(Debug, Default)]
pub struct InMemoryPinSet {
    state: RwLock<PinState>,
}

impl InMemoryPinSet {
    /// Create a new empty pin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a pin set from a JSON file. A missing file yields an empty set.
    pub fn load(path: impl AsRef<Path>) -> PinResult<Self> {
        let path = path.as_ref();
        let state = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PinState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Persist the pin set as JSON, replacing `path` atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> PinResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(&*self.read()?)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read(&self) -> PinResult<RwLockReadGuard<'_, PinState>> {
        self.state
            .read()
            .map_err(|e| PinError::Lookup(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> PinResult<RwLockWriteGuard<'_, PinState>> {
        self.state
            .write()
            .map_err(|e| PinError::Lookup(format!("lock poisoned: {e}")))
    }

    /// Pin a single block.
    ///
    /// Fails if the block is already a recursive root.
    pub fn pin_direct(&self, id: ContentId) -> PinResult<()> {
        let mut state = self.write()?;
        if state.recursive.contains_key(&id) {
            return Err(PinError::AlreadyPinned {
                id,
                kind: PinKind::Recursive,
            });
        }
        state.direct.insert(id);
        debug!(id = %id.short(), "pinned direct");
        Ok(())
    }

    /// Pin `root` recursively, protecting `descendants` indirectly.
    ///
    /// A direct pin on `root` is upgraded.
    pub fn pin_recursive(
        &self,
        root: ContentId,
        descendants: impl IntoIterator<Item = ContentId>,
    ) -> PinResult<()> {
        let mut state = self.write()?;
        state.direct.remove(&root);
        let entry = state.recursive.entry(root).or_default();
        entry.extend(descendants.into_iter().filter(|d| *d != root));
        debug!(id = %root.short(), descendants = entry.len(), "pinned recursive");
        Ok(())
    }

    /// Mark a block as held by the node itself.
    pub fn pin_internal(&self, id: ContentId) -> PinResult<()> {
        self.write()?.internal.insert(id);
        Ok(())
    }

    /// Remove a direct or recursive pin. Returns `true` if one was removed.
    ///
    /// Internal pins and indirect protection are not affected.
    pub fn unpin(&self, id: &ContentId) -> PinResult<bool> {
        let mut state = self.write()?;
        let removed = state.direct.remove(id) | state.recursive.remove(id).is_some();
        if removed {
            debug!(id = %id.short(), "unpinned");
        }
        Ok(removed)
    }

    /// All pins of the kinds in `scope`, sorted by identifier.
    ///
    /// A block protected in several ways is listed once, under the first
    /// matching kind in check order.
    pub fn list(&self, scope: PinQueryScope) -> PinResult<Vec<(ContentId, PinKind)>> {
        let state = self.read()?;
        let mut out: BTreeMap<ContentId, PinKind> = BTreeMap::new();
        for kind in PinKind::ALL {
            if !scope.contains(kind) {
                continue;
            }
            let ids: Box<dyn Iterator<Item = &ContentId>> = match kind {
                PinKind::Recursive => Box::new(state.recursive.keys()),
                PinKind::Direct => Box::new(state.direct.iter()),
                PinKind::Internal => Box::new(state.internal.iter()),
                PinKind::Indirect => Box::new(state.recursive.values().flatten()),
            };
            for id in ids {
                out.entry(*id).or_insert(kind);
            }
        }
        Ok(out.into_iter().collect())
    }

    /// Number of explicit pins (direct, recursive and internal).
    pub fn len(&self) -> usize {
        self.read()
            .map(|s| s.direct.len() + s.recursive.len() + s.internal.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn status(state: &PinState, id: &ContentId, scope: PinQueryScope) -> PinStatus {
        if scope.contains(PinKind::Recursive) && state.recursive.contains_key(id) {
            return PinStatus::pinned(PinReason::Recursive);
        }
        if scope.contains(PinKind::Direct) && state.direct.contains(id) {
            return PinStatus::pinned(PinReason::Direct);
        }
        if scope.contains(PinKind::Internal) && state.internal.contains(id) {
            return PinStatus::pinned(PinReason::Internal);
        }
        if scope.contains(PinKind::Indirect) {
            let holder = state
                .recursive
                .iter()
                .find(|(_, descendants)| descendants.contains(id));
            if let Some((ancestor, _)) = holder {
                return PinStatus::pinned(PinReason::Indirect {
                    ancestor: *ancestor,
                });
            }
        }
        PinStatus::unpinned()
    }
}

#[async_trait]
impl PinOracle for InMemoryPinSet {
    async fn is_pinned_with_type(
        &self,
        id: &ContentId,
        scope: PinQueryScope,
    ) -> PinResult<PinStatus> {
        let state = self.read()?;
        Ok(Self::status(&state, id, scope))
    }
}

#[async_trait]
impl PinWriter for InMemoryPinSet {
    async fn add_pin(
        &self,
        id: ContentId,
        kind: PinKind,
        descendants: Vec<ContentId>,
    ) -> PinResult<()> {
        match kind {
            PinKind::Direct => self.pin_direct(id),
            PinKind::Recursive => self.pin_recursive(id, descendants),
            PinKind::Internal => self.pin_internal(id),
            PinKind::Indirect => Err(PinError::NotPinnable(kind)),
        }
    }

    async fn remove_pin(&self, id: &ContentId) -> PinResult<bool> {
        self.unpin(id)
    }

    async fn list_pins(&self, scope: PinQueryScope) -> PinResult<Vec<(ContentId, PinKind)>> {
        self.list(scope)
    }
}
