//! The GC lock for Blox.
//!
//! One [`GcLock`] per node serializes garbage collection and block removal
//! (write side) against block additions and pinning (read side). Holders get
//! a [`LockHandle`]; dropping it releases the lock, so every exit path
//! releases exactly once.

pub mod error;
pub mod lock;

pub use error::LockError;
pub use lock::{GcLock, LockHandle, LockMode, LockStats};
