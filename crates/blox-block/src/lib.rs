//! Block operations for Blox: adding, pinning and removing blocks under the
//! node's GC lock.
//!
//! Removal is the delicate part. A batch holds the write side of the lock
//! for its whole duration, checks each block's pins immediately before
//! deleting it, and processes identifiers with bounded concurrency while
//! streaming one [`RemovalOutcome`] per identifier back to the caller.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use blox_block::{BlockConfig, BlockService, RmOptions};
//! use blox_lock::GcLock;
//! use blox_pin::InMemoryPinSet;
//! use blox_store::InMemoryBlockStore;
//! use blox_types::BlockFormat;
//! use futures::StreamExt;
//!
//! # tokio_test_block_on(async {
//! let service = BlockService::new(
//!     Arc::new(InMemoryBlockStore::new()),
//!     Arc::new(InMemoryPinSet::new()),
//!     GcLock::new(),
//!     BlockConfig::default(),
//! )
//! .unwrap();
//! let id = service.put(b"hello".to_vec(), BlockFormat::Raw).await.unwrap();
//! let outcomes: Vec<_> = service.rm([id], RmOptions::default()).collect().await;
//! assert!(outcomes[0].as_ref().unwrap().is_ok());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod remove;
pub mod service;

pub use config::{BlockConfig, DEFAULT_RM_CONCURRENCY};
pub use error::{BlockError, BlockResult, RemovalError};
pub use outcome::{ItemFailure, ItemResult, RemovalFailure, RemovalOutcome, RmOptions};
pub use remove::RemovalStream;
pub use service::{BlockService, BlockStat, PinService};
