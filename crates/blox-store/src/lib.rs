//! Content-addressed block storage for Blox.
//!
//! Every block is an immutable payload keyed by its [`ContentId`]. The store
//! never interprets payloads.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`InMemoryBlockStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlockStore`] -- one file per block under a sharded directory
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once written (content-addressing guarantees this).
//! 2. `delete` never checks existence itself; callers decide what "absent" means.
//! 3. Deletion is only safe under the write side of the node's GC lock.
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`ContentId`]: blox_types::ContentId

pub mod block;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use block::Block;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlockStore;
pub use memory::InMemoryBlockStore;
pub use traits::BlockStore;
