//! Resolver method table
//!
//! Every record accessor is one entry in a closed set of methods. Each entry
//! describes the contract method name, the argument shape after the leading
//! node, the shape of the returned value and whether it is a write.

use crate::contract::ContractCall;
use ens_core::{Error, Node, RecordKind, Result, Token};

/// Argument shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// `address`
    Address,
    /// `string`
    String,
    /// Dynamic `bytes`
    Bytes,
    /// `bytes32`
    Bytes32,
    /// `bytes4` interface id
    InterfaceId,
}

impl ArgKind {
    /// Whether `token` fits this argument
    pub fn accepts(&self, token: &Token) -> bool {
        match (self, token) {
            (ArgKind::Address, Token::Address(_)) => true,
            (ArgKind::String, Token::String(_)) => true,
            (ArgKind::Bytes, Token::Bytes(_)) => true,
            (ArgKind::Bytes32, Token::FixedBytes(bytes)) => bytes.len() == 32,
            (ArgKind::InterfaceId, Token::InterfaceId(_)) => true,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ArgKind::Address => "address",
            ArgKind::String => "string",
            ArgKind::Bytes => "bytes",
            ArgKind::Bytes32 => "bytes32",
            ArgKind::InterfaceId => "bytes4",
        }
    }
}

/// Return value shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// Write method, the result is a transaction
    Transaction,
    /// `address`
    Address,
    /// `string`
    String,
    /// `bytes` or `bytesN`
    Bytes,
    /// `(bytes32, bytes32)`
    PublicKey,
    /// `bool`
    Bool,
}

impl ReturnKind {
    /// Whether `token` fits this return shape
    pub fn accepts(&self, token: &Token) -> bool {
        match (self, token) {
            (ReturnKind::Address, Token::Address(_)) => true,
            (ReturnKind::String, Token::String(_)) => true,
            (ReturnKind::Bytes, Token::Bytes(_) | Token::FixedBytes(_)) => true,
            (ReturnKind::PublicKey, Token::Tuple(items)) => items.len() == 2,
            (ReturnKind::Bool, Token::Bool(_)) => true,
            _ => false,
        }
    }

    /// Shape name used in decode errors
    pub fn name(&self) -> &'static str {
        match self {
            ReturnKind::Transaction => "transaction",
            ReturnKind::Address => "address",
            ReturnKind::String => "string",
            ReturnKind::Bytes => "bytes",
            ReturnKind::PublicKey => "tuple(bytes32,bytes32)",
            ReturnKind::Bool => "bool",
        }
    }
}

/// Static description of a resolver method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Contract method name
    pub name: &'static str,
    /// Whether the node is the leading argument
    pub takes_node: bool,
    /// Arguments after the node
    pub args: &'static [ArgKind],
    /// Return shape
    pub returns: ReturnKind,
    /// Record served by this method
    pub record: Option<RecordKind>,
}

impl MethodSpec {
    /// Write method
    pub fn is_mutation(&self) -> bool {
        self.returns == ReturnKind::Transaction
    }
}

/// Resolver methods exposed by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverMethod {
    /// `addr(node)`
    Addr,
    /// `setAddr(node, address)`
    SetAddr,
    /// `pubkey(node)`
    Pubkey,
    /// `setPubkey(node, x, y)`
    SetPubkey,
    /// `text(node, key)`
    Text,
    /// `setText(node, key, value)`
    SetText,
    /// `content(node)`
    Content,
    /// `setContent(node, hash)`
    SetContent,
    /// `multihash(node)`
    Multihash,
    /// `setMultihash(node, hash)`
    SetMultihash,
    /// `contenthash(node)`
    Contenthash,
    /// `setContenthash(node, hash)`
    SetContenthash,
    /// `supportsInterface(interfaceId)`
    SupportsInterface,
}

impl ResolverMethod {
    /// Every method in the table
    pub const ALL: [ResolverMethod; 13] = [
        ResolverMethod::Addr,
        ResolverMethod::SetAddr,
        ResolverMethod::Pubkey,
        ResolverMethod::SetPubkey,
        ResolverMethod::Text,
        ResolverMethod::SetText,
        ResolverMethod::Content,
        ResolverMethod::SetContent,
        ResolverMethod::Multihash,
        ResolverMethod::SetMultihash,
        ResolverMethod::Contenthash,
        ResolverMethod::SetContenthash,
        ResolverMethod::SupportsInterface,
    ];

    /// Table entry for this method
    pub const fn spec(&self) -> MethodSpec {
        use ArgKind::*;

        const fn read(
            name: &'static str,
            args: &'static [ArgKind],
            returns: ReturnKind,
            record: RecordKind,
        ) -> MethodSpec {
            MethodSpec {
                name,
                takes_node: true,
                args,
                returns,
                record: Some(record),
            }
        }
        const fn write(
            name: &'static str,
            args: &'static [ArgKind],
            record: RecordKind,
        ) -> MethodSpec {
            read(name, args, ReturnKind::Transaction, record)
        }

        match self {
            ResolverMethod::Addr => read("addr", &[], ReturnKind::Address, RecordKind::Address),
            ResolverMethod::SetAddr => write("setAddr", &[Address], RecordKind::Address),
            ResolverMethod::Pubkey => {
                read("pubkey", &[], ReturnKind::PublicKey, RecordKind::Pubkey)
            }
            ResolverMethod::SetPubkey => {
                write("setPubkey", &[Bytes32, Bytes32], RecordKind::Pubkey)
            }
            ResolverMethod::Text => read("text", &[String], ReturnKind::String, RecordKind::Text),
            ResolverMethod::SetText => write("setText", &[String, String], RecordKind::Text),
            ResolverMethod::Content => read("content", &[], ReturnKind::Bytes, RecordKind::Content),
            ResolverMethod::SetContent => write("setContent", &[Bytes32], RecordKind::Content),
            ResolverMethod::Multihash => {
                read("multihash", &[], ReturnKind::Bytes, RecordKind::Multihash)
            }
            ResolverMethod::SetMultihash => write("setMultihash", &[Bytes], RecordKind::Multihash),
            ResolverMethod::Contenthash => {
                read("contenthash", &[], ReturnKind::Bytes, RecordKind::Contenthash)
            }
            ResolverMethod::SetContenthash => {
                write("setContenthash", &[Bytes], RecordKind::Contenthash)
            }
            ResolverMethod::SupportsInterface => MethodSpec {
                name: "supportsInterface",
                takes_node: false,
                args: &[InterfaceId],
                returns: ReturnKind::Bool,
                record: None,
            },
        }
    }

    /// Contract method name
    pub const fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Write method
    pub fn is_mutation(&self) -> bool {
        self.spec().is_mutation()
    }

    /// Build the contract call, prepending `node` when the method takes it
    pub fn build_call(&self, node: Node, args: Vec<Token>) -> Result<ContractCall> {
        let spec = self.spec();

        if args.len() != spec.args.len() {
            return Err(Error::InvalidArguments {
                method: spec.name.to_string(),
                reason: format!("expected {} arguments, got {}", spec.args.len(), args.len()),
            });
        }

        for (position, (kind, token)) in spec.args.iter().zip(&args).enumerate() {
            if !kind.accepts(token) {
                return Err(Error::InvalidArguments {
                    method: spec.name.to_string(),
                    reason: format!(
                        "argument {} must be {}, got {}",
                        position,
                        kind.name(),
                        token.kind()
                    ),
                });
            }
        }

        let mut call_args = Vec::with_capacity(args.len() + 1);
        if spec.takes_node {
            call_args.push(Token::Node(node));
        }
        call_args.extend(args);

        Ok(ContractCall::new(spec.name, call_args))
    }

    /// Look a method up by contract name
    pub fn from_name(name: &str) -> Option<ResolverMethod> {
        Self::ALL.iter().copied().find(|method| method.name() == name)
    }
}
