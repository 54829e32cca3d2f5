//! Foundation types for Blox.
//!
//! Every other Blox crate depends on `blox-types`.
//!
//! # Key Types
//!
//! - [`ContentId`]: content identifier: hash algorithm, block format and digest
//! - [`BlockFormat`] / [`HashAlgorithm`]: the tags carried by a [`ContentId`]
//! - [`TextBase`]: the text encodings an identifier can be written in
//! - [`CidInput`]: the representations callers may use to name a block
//! - [`normalize`]: decode a [`CidInput`] into a canonical [`ContentId`]

pub mod cid;
pub mod error;
pub mod input;

pub use cid::{BlockFormat, ContentId, HashAlgorithm, TextBase, DIGEST_LEN};
pub use error::TypeError;
pub use input::{normalize, CidInput};
