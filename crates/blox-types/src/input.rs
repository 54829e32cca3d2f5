use crate::cid::ContentId;
use crate::error::TypeError;

/// Any representation a caller may use to name a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CidInput {
    /// An already-decoded identifier.
    Cid(ContentId),
    /// The text form (`f...`).
    Text(String),
    /// The binary form.
    Bytes(Vec<u8>),
}

impl CidInput {
    /// Decode into a canonical [`ContentId`].
    pub fn normalize(self) -> Result<ContentId, TypeError> {
        match self {
            Self::Cid(id) => Ok(id),
            Self::Text(text) => ContentId::from_text(&text),
            Self::Bytes(bytes) => ContentId::from_bytes(&bytes),
        }
    }
}

impl From<ContentId> for CidInput {
    fn from(id: ContentId) -> Self {
        Self::Cid(id)
    }
}

impl From<&ContentId> for CidInput {
    fn from(id: &ContentId) -> Self {
        Self::Cid(*id)
    }
}

impl From<String> for CidInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for CidInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<&String> for CidInput {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<Vec<u8>> for CidInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for CidInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Normalize any supported representation into a [`ContentId`].
pub fn normalize(input: impl Into<CidInput>) -> Result<ContentId, TypeError> {
    input.into().normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::BlockFormat;

    #[test]
    fn all_representations_agree() {
        let id = ContentId::compute(BlockFormat::DagCbor, b"node");
        let from_value = normalize(id).unwrap();
        let from_text = normalize(id.to_string()).unwrap();
        let from_str = normalize(id.to_string().as_str()).unwrap();
        let from_bytes = normalize(id.to_bytes()).unwrap();
        let from_slice = normalize(id.to_bytes().as_slice()).unwrap();
        assert_eq!(from_value, id);
        assert_eq!(from_text, id);
        assert_eq!(from_str, id);
        assert_eq!(from_bytes, id);
        assert_eq!(from_slice, id);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            normalize("fnot-hex"),
            Err(TypeError::InvalidHex(_))
        ));
        assert!(normalize("").is_err());
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        assert_eq!(normalize(vec![0x01u8, 0x55]), Err(TypeError::Truncated));
    }
}
