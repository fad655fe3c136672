use sha2::{Digest, Sha256};

use super::block::Block;

/// Returns the SHA-256 digest of `data` as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hashes a block over its canonical string.
///
/// This is the value the next block stores as `previous_hash`.
pub fn hash_block(block: &Block) -> String {
    sha256_hex(block.canonical_string().as_bytes())
}
