use blox_types::{BlockFormat, ContentId};

/// A block: an immutable payload together with the identifier it hashes to.
///
/// The store never interprets the payload. It is keyed by [`ContentId`] only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    id: ContentId,
    data: Vec<u8>,
}

impl Block {
    /// Create a block, computing its identifier from `data`.
    pub fn new(format: BlockFormat, data: Vec<u8>) -> Self {
        let id = ContentId::compute(format, &data);
        Self { id, data }
    }

    /// Pair `data` with an identifier computed elsewhere.
    ///
    /// No verification happens here. Use [`Block::verify`] when the pairing
    /// comes from an untrusted source.
    pub fn with_id(id: ContentId, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns `true` if the payload hashes to the block's identifier.
    pub fn verify(&self) -> bool {
        self.id.verifies(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_verifies() {
        let block = Block::new(BlockFormat::Raw, b"hello".to_vec());
        assert!(block.verify());
        assert_eq!(block.size(), 5);
        assert_eq!(block.id(), &ContentId::compute(BlockFormat::Raw, b"hello"));
    }

    #[test]
    fn mismatched_pairing_fails_verification() {
        let id = ContentId::compute(BlockFormat::Raw, b"one");
        let block = Block::with_id(id, b"two".to_vec());
        assert!(!block.verify());
    }
}
