//! Domain nodes and the namehash capability

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node length in bytes
pub const NODE_LENGTH: usize = 32;

/// Fixed-size domain node identifier derived from a name
///
/// Used as the registry lookup key and as the leading argument of every
/// record method on a resolver.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Node([u8; NODE_LENGTH]);

impl Node {
    /// The root node (all zero bytes)
    pub const ROOT: Node = Node([0u8; NODE_LENGTH]);

    /// Wrap raw node bytes
    pub const fn from_bytes(bytes: [u8; NODE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw node bytes
    pub fn as_bytes(&self) -> &[u8; NODE_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.to_hex())
    }
}

impl FromStr for Node {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::InvalidName(format!("Invalid node hex {}: {}", s, e)))?;
        let bytes: [u8; NODE_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            Error::InvalidName(format!(
                "Node must be {} bytes, got {}",
                NODE_LENGTH,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Node {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Node> for String {
    fn from(node: Node) -> Self {
        node.to_hex()
    }
}

impl From<[u8; NODE_LENGTH]> for Node {
    fn from(bytes: [u8; NODE_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// Name hashing capability
///
/// A pure function from a human-readable name to its node. Implementations
/// reject malformed names with [`Error::InvalidName`].
pub trait NamehashProvider: Send + Sync {
    /// Compute the node for `name`
    fn hash(&self, name: &str) -> Result<Node>;
}

impl<F> NamehashProvider for F
where
    F: Fn(&str) -> Result<Node> + Send + Sync,
{
    fn hash(&self, name: &str) -> Result<Node> {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_hex_roundtrip() {
        let mut bytes = [0u8; NODE_LENGTH];
        bytes[31] = 0xab;
        let node = Node::from_bytes(bytes);

        let hex = node.to_string();
        assert!(hex.starts_with("0x"));
        assert!(hex.ends_with("ab"));
        assert_eq!(hex.parse::<Node>().unwrap(), node);
    }

    #[test]
    fn test_node_rejects_wrong_length() {
        assert!("0x1234".parse::<Node>().is_err());
        assert!("zz".parse::<Node>().is_err());
    }

    #[test]
    fn test_root_node() {
        assert_eq!(Node::ROOT.as_bytes(), &[0u8; NODE_LENGTH]);
    }

    #[test]
    fn test_closure_namehash_provider() {
        let provider = |name: &str| -> Result<Node> {
            if name.is_empty() {
                return Err(Error::InvalidName("empty".to_string()));
            }
            Ok(Node::from_bytes([name.len() as u8; NODE_LENGTH]))
        };

        assert_eq!(provider.hash("abc").unwrap(), Node::from_bytes([3; NODE_LENGTH]));
        assert!(matches!(provider.hash(""), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_node_serde() {
        let node = Node::from_bytes([1; NODE_LENGTH]);
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
