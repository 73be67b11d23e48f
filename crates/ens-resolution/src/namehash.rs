//! ENS namehash
//!
//! `namehash("") = 0x00..00` and
//! `namehash(label.rest) = keccak256(namehash(rest) || keccak256(label))`.

use ens_core::{Error, NamehashProvider, Node, Result};
use sha3::{Digest, Keccak256};

/// Namehash over Keccak-256, producing the nodes the ENS registry stores
///
/// Labels are lower-cased before hashing. Full UTS-46 normalization is not
/// applied, so callers should pass names that are already normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsNamehash;

impl NamehashProvider for EnsNamehash {
    fn hash(&self, name: &str) -> Result<Node> {
        if name.is_empty() {
            return Ok(Node::ROOT);
        }

        let mut node = [0u8; 32];
        for label in name.rsplit('.') {
            if label.is_empty() {
                return Err(Error::InvalidName(format!("empty label in {:?}", name)));
            }
            let label_hash = Keccak256::digest(label.to_lowercase().as_bytes());

            let mut hasher = Keccak256::new();
            hasher.update(node);
            hasher.update(label_hash);
            node = hasher.finalize().into();
        }
        Ok(Node::from(node))
    }
}
