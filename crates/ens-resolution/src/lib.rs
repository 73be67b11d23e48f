//! ENS name resolution
//!
//! Resolves a human-readable name to its resolver contract through the
//! registry and reads or writes the resolver's records. Reads resolve to a
//! decoded value; writes return a [`LifecycleOperation`] that reports the
//! transaction hash, confirmations and receipt as they happen.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod facade;
pub mod invoker;
pub mod lifecycle;
pub mod memory;
pub mod method;
pub mod namehash;
pub mod registry;

pub use contract::{
    ContractCall, ContractTransport, ResolverHandle, SignalSender, SignalStream,
    TransactionSignal,
};
pub use facade::{Ens, MutationCall, QueryCall};
pub use invoker::ResolverInvoker;
pub use lifecycle::{
    Callback, LifecycleEvent, LifecycleEventKind, LifecycleEvents, LifecycleOperation,
};
pub use memory::MemoryChain;
pub use method::{ArgKind, MethodSpec, ResolverMethod, ReturnKind};
pub use namehash::EnsNamehash;
pub use registry::{ContractRegistry, RegistryClient};

pub use ens_core::{
    Address, EnsConfig, Error, InterfaceId, NamehashProvider, Node, PublicKey, Receipt,
    RecordKind, Result, SendOptions, Token, TransactionFailure, TransactionState,
};
