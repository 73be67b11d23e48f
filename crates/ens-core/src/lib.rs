//! ENS resolution core
//!
//! Shared domain types for the resolution layer: nodes and the namehash
//! capability, addresses and interface ids, decoded contract values,
//! transaction receipts and send options, configuration, and errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod config;
pub mod error;
pub mod node;
pub mod token;
pub mod transaction;

pub use address::{Address, InterfaceId, RecordKind, ADDRESS_LENGTH};
pub use config::{EnsConfig, LifecycleConfig, MAINNET_REGISTRY_ADDRESS};
pub use error::{Error, ErrorCategory, Result};
pub use node::{NamehashProvider, Node, NODE_LENGTH};
pub use token::{FromToken, PublicKey, Token};
pub use transaction::{Receipt, SendOptions, TransactionFailure, TransactionState};
