//! Pin queries for Blox.
//!
//! A pin protects a block from removal. This crate defines the query
//! contract the removal pipeline consults before deleting anything, plus an
//! in-memory pin set for tests and small nodes.
//!
//! # Modules
//!
//! - [`error`]: Error types for pin operations
//! - [`types`]: [`PinKind`], [`PinReason`], [`PinQueryScope`], [`PinStatus`]
//! - [`traits`]: The [`PinOracle`] query trait and the [`PinWriter`] mutation trait
//! - [`memory`]: [`InMemoryPinSet`], with JSON persistence

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{PinError, PinResult};
pub use memory::InMemoryPinSet;
pub use traits::{PinOracle, PinWriter};
pub use types::{PinKind, PinQueryScope, PinReason, PinStatus};
