//! Decoded contract values
//!
//! ABI encoding happens in the transport; this layer only sees arguments and
//! return values as [`Token`]s and converts them into typed record values.

use crate::address::{Address, InterfaceId};
use crate::node::Node;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Contract argument or return value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Token {
    /// `bytes32` domain node
    Node(Node),
    /// `address`
    Address(Address),
    /// `string`
    String(String),
    /// Dynamic `bytes`
    Bytes(Vec<u8>),
    /// `bytesN`
    FixedBytes(Vec<u8>),
    /// `bool`
    Bool(bool),
    /// `bytes4` interface id
    InterfaceId(InterfaceId),
    /// Tuple of values
    Tuple(Vec<Token>),
}

impl Token {
    /// Shape name used in decode errors
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Node(_) => "node",
            Token::Address(_) => "address",
            Token::String(_) => "string",
            Token::Bytes(_) => "bytes",
            Token::FixedBytes(_) => "fixed bytes",
            Token::Bool(_) => "bool",
            Token::InterfaceId(_) => "interface id",
            Token::Tuple(_) => "tuple",
        }
    }
}

/// Public key record: the (x, y) coordinates of a secp256k1 point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// X coordinate
    pub x: [u8; 32],
    /// Y coordinate
    pub y: [u8; 32],
}

impl PublicKey {
    /// Create from coordinates
    pub fn new(x: [u8; 32], y: [u8; 32]) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are zero (no key set)
    pub fn is_empty(&self) -> bool {
        self.x == [0u8; 32] && self.y == [0u8; 32]
    }
}

/// Conversion from a decoded return value
pub trait FromToken: Sized {
    /// Expected shape, for error messages
    const SHAPE: &'static str;

    /// Convert `token`, or hand it back when the shape does not match
    fn from_token(token: Token) -> std::result::Result<Self, Token>;

    /// Convert `token` returned by `method`
    fn decode(method: &str, token: Token) -> Result<Self> {
        Self::from_token(token).map_err(|token| Error::Decode {
            method: method.to_string(),
            expected: Self::SHAPE.to_string(),
            got: token.kind().to_string(),
        })
    }
}

impl FromToken for Token {
    const SHAPE: &'static str = "any";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        Ok(token)
    }
}

impl FromToken for Address {
    const SHAPE: &'static str = "address";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        match token {
            Token::Address(address) => Ok(address),
            other => Err(other),
        }
    }
}

impl FromToken for String {
    const SHAPE: &'static str = "string";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        match token {
            Token::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromToken for Vec<u8> {
    const SHAPE: &'static str = "bytes";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        match token {
            Token::Bytes(bytes) | Token::FixedBytes(bytes) => Ok(bytes),
            other => Err(other),
        }
    }
}

impl FromToken for bool {
    const SHAPE: &'static str = "bool";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        match token {
            Token::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromToken for PublicKey {
    const SHAPE: &'static str = "tuple(bytes32,bytes32)";

    fn from_token(token: Token) -> std::result::Result<Self, Token> {
        let coords = match &token {
            Token::Tuple(items) if items.len() == 2 => {
                match (bytes32(&items[0]), bytes32(&items[1])) {
                    (Some(x), Some(y)) => Some((x, y)),
                    _ => None,
                }
            }
            _ => None,
        };

        match coords {
            Some((x, y)) => Ok(PublicKey { x, y }),
            None => Err(token),
        }
    }
}

fn bytes32(token: &Token) -> Option<[u8; 32]> {
    match token {
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => bytes.as_slice().try_into().ok(),
        _ => None,
    }
}

impl From<PublicKey> for Token {
    fn from(key: PublicKey) -> Self {
        Token::Tuple(vec![
            Token::FixedBytes(key.x.to_vec()),
            Token::FixedBytes(key.y.to_vec()),
        ])
    }
}
