use thiserror::Error;

/// Errors produced while decoding a content identifier.
///
/// Every variant is a flavour of "invalid identifier": the input could not
/// be decoded into a well-formed digest/format pair.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty identifier")]
    Empty,

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid base32 string: {0}")]
    InvalidBase32(String),

    #[error("unsupported multibase prefix: {0:?}")]
    UnsupportedBase(char),

    #[error("unsupported identifier version: {0}")]
    UnsupportedVersion(u64),

    #[error("unknown block format code: 0x{0:x}")]
    UnknownFormat(u64),

    #[error("unknown hash algorithm code: 0x{0:x}")]
    UnknownHash(u64),

    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("identifier is truncated")]
    Truncated,

    #[error("identifier has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("varint overflow")]
    VarintOverflow,

    #[error("unknown name: {0}")]
    UnknownName(String),
}
