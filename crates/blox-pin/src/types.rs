//! Pin categories, reasons and query scopes.
//!
//! A pin protects a block from removal and garbage collection. Pins come in
//! four kinds: direct (the block alone), recursive (a root and everything
//! below it), indirect (held through an ancestor's recursive pin) and
//! internal (node bookkeeping).

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use blox_types::ContentId;
use serde::{Deserialize, Serialize};

use crate::error::PinError;

/// The category of a pin, without the data an indirect pin carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Direct,
    Recursive,
    Indirect,
    Internal,
}

impl PinKind {
    pub const ALL: [PinKind; 4] = [
        PinKind::Recursive,
        PinKind::Direct,
        PinKind::Internal,
        PinKind::Indirect,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Recursive => "recursive",
            Self::Indirect => "indirect",
            Self::Internal => "internal",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Direct => 0b0001,
            Self::Recursive => 0b0010,
            Self::Indirect => 0b0100,
            Self::Internal => 0b1000,
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PinKind {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "recursive" => Ok(Self::Recursive),
            "indirect" => Ok(Self::Indirect),
            "internal" => Ok(Self::Internal),
            other => Err(PinError::UnknownKind(other.to_string())),
        }
    }
}

/// Why a block is currently protected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PinReason {
    Direct,
    Recursive,
    /// Protected because `ancestor` is pinned recursively.
    Indirect { ancestor: ContentId },
    Internal,
}

impl PinReason {
    pub fn kind(&self) -> PinKind {
        match self {
            Self::Direct => PinKind::Direct,
            Self::Recursive => PinKind::Recursive,
            Self::Indirect { .. } => PinKind::Indirect,
            Self::Internal => PinKind::Internal,
        }
    }

    /// The ancestor holding an indirect pin, if any.
    pub fn ancestor(&self) -> Option<&ContentId> {
        match self {
            Self::Indirect { ancestor } => Some(ancestor),
            _ => None,
        }
    }
}

/// Simple categories print their name; indirect pins print the ancestor.
impl fmt::Display for PinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indirect { ancestor } => write!(f, "{ancestor}"),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// A set of pin kinds to consider when asking whether a block is protected.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinQueryScope(u8);

impl PinQueryScope {
    pub const NONE: Self = Self(0);
    pub const DIRECT: Self = Self(PinKind::Direct.bit());
    pub const RECURSIVE: Self = Self(PinKind::Recursive.bit());
    pub const INDIRECT: Self = Self(PinKind::Indirect.bit());
    pub const INTERNAL: Self = Self(PinKind::Internal.bit());
    pub const ALL: Self = Self(0b1111);

    pub const fn only(kind: PinKind) -> Self {
        Self(kind.bit())
    }

    pub const fn contains(self, kind: PinKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PinQueryScope {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<PinKind> for PinQueryScope {
    fn from(kind: PinKind) -> Self {
        Self::only(kind)
    }
}

impl Default for PinQueryScope {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for PinQueryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<&str> = PinKind::ALL
            .iter()
            .filter(|k| self.contains(**k))
            .map(|k| k.name())
            .collect();
        write!(f, "PinQueryScope({})", kinds.join("|"))
    }
}

/// Answer to "is this block protected?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinStatus {
    pub pinned: bool,
    pub reason: Option<PinReason>,
}

impl PinStatus {
    pub const fn unpinned() -> Self {
        Self {
            pinned: false,
            reason: None,
        }
    }

    pub const fn pinned(reason: PinReason) -> Self {
        Self {
            pinned: true,
            reason: Some(reason),
        }
    }
}
