//! Contract addresses and interface identifiers

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address length in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Account or contract address
///
/// Stored as `0x`-prefixed lowercase hex. [`Address::new`] accepts any hex
/// text (short forms such as `0x0` included); [`FromStr`] enforces a full
/// 20-byte address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Wrap an address string without length validation
    pub fn new(address: impl AsRef<str>) -> Self {
        let address = address.as_ref();
        let digits = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .unwrap_or(address);
        Self(format!("0x{}", digits.to_ascii_lowercase()))
    }

    /// The zero address
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(ADDRESS_LENGTH * 2)))
    }

    /// True when every hex digit is zero
    pub fn is_zero(&self) -> bool {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        digits.chars().all(|c| c == '0')
    }

    /// Address text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Address::new(address)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let address = Address::new(s);
        let digits = &address.0[2..];

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(Error::InvalidArguments {
                method: "address".to_string(),
                reason: format!("{} is not a {}-byte address", s, ADDRESS_LENGTH),
            });
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidArguments {
                method: "address".to_string(),
                reason: format!("{} contains non-hex characters", s),
            });
        }

        Ok(address)
    }
}

/// Four-byte interface identifier (ERC-165)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceId([u8; 4]);

impl InterfaceId {
    /// `addr(bytes32)`
    pub const ADDR: InterfaceId = InterfaceId([0x3b, 0x3b, 0x57, 0xde]);
    /// `pubkey(bytes32)`
    pub const PUBKEY: InterfaceId = InterfaceId([0xc8, 0x69, 0x02, 0x33]);
    /// `text(bytes32,string)`
    pub const TEXT: InterfaceId = InterfaceId([0x59, 0xd1, 0xd4, 0x3c]);
    /// `content(bytes32)`
    pub const CONTENT: InterfaceId = InterfaceId([0xd8, 0x38, 0x9d, 0xc5]);
    /// `multihash(bytes32)`
    pub const MULTIHASH: InterfaceId = InterfaceId([0xe8, 0x94, 0x01, 0xa1]);
    /// `contenthash(bytes32)`
    pub const CONTENTHASH: InterfaceId = InterfaceId([0xbc, 0x1c, 0x58, 0xd1]);

    /// Wrap raw selector bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw selector bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceId({})", self)
    }
}

impl FromStr for InterfaceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let invalid = |reason: String| Error::InvalidArguments {
            method: "supportsInterface".to_string(),
            reason,
        };
        let bytes = hex::decode(digits).map_err(|e| invalid(format!("{}: {}", s, e)))?;
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| invalid(format!("{} is not a 4-byte interface id", s)))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for InterfaceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<InterfaceId> for String {
    fn from(id: InterfaceId) -> Self {
        id.to_string()
    }
}

/// Record types a resolver can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Address record
    Address,
    /// Public key record
    Pubkey,
    /// Text record
    Text,
    /// Legacy content record
    Content,
    /// Multihash record
    Multihash,
    /// Content hash record
    Contenthash,
}

impl RecordKind {
    /// All record kinds
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Address,
        RecordKind::Pubkey,
        RecordKind::Text,
        RecordKind::Content,
        RecordKind::Multihash,
        RecordKind::Contenthash,
    ];

    /// Interface id a resolver advertises for this record
    pub fn interface_id(&self) -> InterfaceId {
        match self {
            RecordKind::Address => InterfaceId::ADDR,
            RecordKind::Pubkey => InterfaceId::PUBKEY,
            RecordKind::Text => InterfaceId::TEXT,
            RecordKind::Content => InterfaceId::CONTENT,
            RecordKind::Multihash => InterfaceId::MULTIHASH,
            RecordKind::Contenthash => InterfaceId::CONTENTHASH,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordKind::Address => "address",
            RecordKind::Pubkey => "public key",
            RecordKind::Text => "text",
            RecordKind::Content => "content",
            RecordKind::Multihash => "multihash",
            RecordKind::Contenthash => "content hash",
        }
    }
}
