use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Identifier version written as the first field of the binary form.
pub const CID_VERSION: u64 = 1;

/// Length in bytes of every supported digest.
pub const DIGEST_LEN: usize = 32;

/// Multibase prefix of the canonical text form (lowercase base16).
pub const BASE16_PREFIX: char = 'f';

/// Hash algorithm that produced a block's digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Sha2_256,
    Blake3,
}

impl HashAlgorithm {
    /// Multicodec code for this algorithm.
    pub const fn code(self) -> u64 {
        match self {
            Self::Sha2_256 => 0x12,
            Self::Blake3 => 0x1e,
        }
    }

    pub fn from_code(code: u64) -> Result<Self, TypeError> {
        match code {
            0x12 => Ok(Self::Sha2_256),
            0x1e => Ok(Self::Blake3),
            other => Err(TypeError::UnknownHash(other)),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding of a block's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockFormat {
    Raw,
    DagPb,
    DagCbor,
    DagJson,
}

impl BlockFormat {
    /// Multicodec code for this format.
    pub const fn code(self) -> u64 {
        match self {
            Self::Raw => 0x55,
            Self::DagPb => 0x70,
            Self::DagCbor => 0x71,
            Self::DagJson => 0x0129,
        }
    }

    pub fn from_code(code: u64) -> Result<Self, TypeError> {
        match code {
            0x55 => Ok(Self::Raw),
            0x70 => Ok(Self::DagPb),
            0x71 => Ok(Self::DagCbor),
            0x0129 => Ok(Self::DagJson),
            other => Err(TypeError::UnknownFormat(other)),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::DagPb => "dag-pb",
            Self::DagCbor => "dag-cbor",
            Self::DagJson => "dag-json",
        }
    }
}

impl fmt::Display for BlockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Self::Raw),
            "dag-pb" => Ok(Self::DagPb),
            "dag-cbor" => Ok(Self::DagCbor),
            "dag-json" => Ok(Self::DagJson),
            other => Err(TypeError::UnknownName(other.to_string())),
        }
    }
}

/// Text encodings an identifier can be written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextBase {
    /// Lowercase hex, multibase prefix `f`. The canonical form.
    #[default]
    Base16,
    /// Lowercase unpadded RFC 4648 base32, multibase prefix `b`.
    Base32,
}

impl TextBase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base16 => "base16",
            Self::Base32 => "base32",
        }
    }

    fn multibase(self) -> multibase::Base {
        match self {
            Self::Base16 => multibase::Base::Base16Lower,
            Self::Base32 => multibase::Base::Base32Lower,
        }
    }
}

impl fmt::Display for TextBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextBase {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base16" => Ok(Self::Base16),
            "base32" => Ok(Self::Base32),
            other => Err(TypeError::UnknownName(other.to_string())),
        }
    }
}

/// Content identifier: names a block by the digest of its contents plus
/// the hash algorithm and block format that produced it.
///
/// Equality is structural. Two inputs that decode to the same algorithm,
/// format and digest are the same identifier regardless of how they were
/// encoded.
///
/// Binary form:
/// ```text
/// varint(version = 1) | varint(format code) | varint(hash code) | varint(32) | digest
/// ```
/// Text form is `f` followed by the lowercase hex of the binary form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId {
    format: BlockFormat,
    hash: HashAlgorithm,
    digest: [u8; DIGEST_LEN],
}

impl ContentId {
    /// Hash `data` with BLAKE3 and tag it with `format`.
    pub fn compute(format: BlockFormat, data: &[u8]) -> Self {
        Self {
            format,
            hash: HashAlgorithm::Blake3,
            digest: *blake3::hash(data).as_bytes(),
        }
    }

    /// Build an identifier from a pre-computed digest.
    pub const fn from_digest(
        hash: HashAlgorithm,
        format: BlockFormat,
        digest: [u8; DIGEST_LEN],
    ) -> Self {
        Self {
            format,
            hash,
            digest,
        }
    }

    pub fn format(&self) -> BlockFormat {
        self.format
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Returns `true` if `data` hashes to this identifier's digest.
    ///
    /// Only BLAKE3 identifiers can be verified locally; other algorithms
    /// always return `false`.
    pub fn verifies(&self, data: &[u8]) -> bool {
        match self.hash {
            HashAlgorithm::Blake3 => blake3::hash(data).as_bytes() == &self.digest,
            HashAlgorithm::Sha2_256 => false,
        }
    }

    /// Encode to the binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DIGEST_LEN + 8);
        write_varint(&mut out, CID_VERSION);
        write_varint(&mut out, self.format.code());
        write_varint(&mut out, self.hash.code());
        write_varint(&mut out, DIGEST_LEN as u64);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Decode the binary form. The whole slice must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.is_empty() {
            return Err(TypeError::Empty);
        }
        let mut cursor = bytes;
        let version = read_varint(&mut cursor)?;
        if version != CID_VERSION {
            return Err(TypeError::UnsupportedVersion(version));
        }
        let format = BlockFormat::from_code(read_varint(&mut cursor)?)?;
        let hash = HashAlgorithm::from_code(read_varint(&mut cursor)?)?;
        let len = read_varint(&mut cursor)? as usize;
        if len != DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: len,
            });
        }
        if cursor.len() < DIGEST_LEN {
            return Err(TypeError::Truncated);
        }
        if cursor.len() > DIGEST_LEN {
            return Err(TypeError::TrailingBytes(cursor.len() - DIGEST_LEN));
        }
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(cursor);
        Ok(Self {
            format,
            hash,
            digest,
        })
    }

    /// Canonical text form.
    pub fn to_text(&self) -> String {
        format!("{BASE16_PREFIX}{}", hex::encode(self.to_bytes()))
    }

    /// Text form in the given base. [`TextBase::Base16`] gives the same
    /// string as [`to_text`](Self::to_text).
    pub fn to_text_in(&self, base: TextBase) -> String {
        multibase::encode(base.multibase(), self.to_bytes())
    }

    /// Parse a text form. Accepts base16 (`f`/`F`) and base32 (`b`/`B`)
    /// and ignores surrounding whitespace.
    pub fn from_text(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let mut chars = s.chars();
        let prefix = chars.next().ok_or(TypeError::Empty)?;
        let body = chars.as_str();
        let bytes = match prefix {
            'f' => hex::decode(body).map_err(|e| TypeError::InvalidHex(e.to_string()))?,
            'F' => hex::decode(body.to_ascii_lowercase())
                .map_err(|e| TypeError::InvalidHex(e.to_string()))?,
            'b' | 'B' => {
                let (_, bytes) =
                    multibase::decode(s).map_err(|e| TypeError::InvalidBase32(e.to_string()))?;
                bytes
            }
            other => return Err(TypeError::UnsupportedBase(other)),
        };
        Self::from_bytes(&bytes)
    }

    /// Short form for logs: format name and the first 8 hex digits of the digest.
    pub fn short(&self) -> String {
        format!("{}:{}", self.format, hex::encode(&self.digest[..4]))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64, TypeError> {
    let mut value: u64 = 0;
    for i in 0..10 {
        let (&byte, rest) = cursor.split_first().ok_or(TypeError::Truncated)?;
        *cursor = rest;
        let bits = u64::from(byte & 0x7f);
        if i == 9 && bits > 1 {
            return Err(TypeError::VarintOverflow);
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(TypeError::VarintOverflow)
}
