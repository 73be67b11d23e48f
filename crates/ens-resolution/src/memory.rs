//! In-memory chain
//!
//! A process-local registry and resolver store implementing both
//! [`RegistryClient`] and [`ContractTransport`], for tests and the harness.
//! Writes are applied when sent and reported through a scripted lifecycle:
//! hash, `confirmations` confirmation signals, then the receipt.

use crate::contract::{ContractCall, ContractTransport, SignalStream, TransactionSignal};
use crate::method::ResolverMethod;
use crate::registry::RegistryClient;
use async_trait::async_trait;
use ens_core::{
    Address, Error, InterfaceId, Node, PublicKey, Receipt, RecordKind, Result, SendOptions, Token,
    TransactionFailure, MAINNET_REGISTRY_ADDRESS,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Records {
    addr: Option<Address>,
    pubkey: Option<PublicKey>,
    text: HashMap<String, String>,
    content: Option<Vec<u8>>,
    multihash: Option<Vec<u8>>,
    contenthash: Option<Vec<u8>>,
}

#[derive(Debug)]
struct ChainState {
    registry_address: Address,
    resolvers: HashMap<Node, Address>,
    owners: HashMap<Node, Address>,
    interfaces: HashMap<Address, HashSet<InterfaceId>>,
    records: HashMap<(Address, Node), Records>,
    block_number: u64,
    transactions: u64,
    confirmations: u64,
    fail_next: Option<TransactionFailure>,
    calls: Vec<(Address, ContractCall)>,
}

/// In-memory registry and resolvers
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryChain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChain {
    /// Empty chain with the registry at the mainnet address
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                registry_address: Address::new(MAINNET_REGISTRY_ADDRESS),
                resolvers: HashMap::new(),
                owners: HashMap::new(),
                interfaces: HashMap::new(),
                records: HashMap::new(),
                block_number: 1,
                transactions: 0,
                confirmations: 1,
                fail_next: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Registry contract address
    pub fn registry_address(&self) -> Address {
        self.state.lock().registry_address.clone()
    }

    /// Deploy a resolver at `address` serving every record kind
    pub fn deploy_resolver(&self, address: Address) {
        let interfaces = RecordKind::ALL.iter().map(|kind| kind.interface_id()).collect();
        self.deploy_resolver_with(address, interfaces);
    }

    /// Deploy a resolver at `address` serving only `interfaces`
    pub fn deploy_resolver_with(&self, address: Address, interfaces: HashSet<InterfaceId>) {
        self.state.lock().interfaces.insert(address, interfaces);
    }

    /// Point `node` at `resolver`
    pub fn set_resolver(&self, node: Node, resolver: Address) {
        self.state.lock().resolvers.insert(node, resolver);
    }

    /// Record `owner` for `node`
    pub fn set_owner(&self, node: Node, owner: Address) {
        self.state.lock().owners.insert(node, owner);
    }

    /// Number of confirmation signals emitted per send
    pub fn set_confirmations(&self, confirmations: u64) {
        self.state.lock().confirmations = confirmations;
    }

    /// Fail the next send with `failure` after its hash is emitted
    pub fn fail_next_send(&self, failure: TransactionFailure) {
        self.state.lock().fail_next = Some(failure);
    }

    /// Every call and send seen so far
    pub fn calls(&self) -> Vec<(Address, ContractCall)> {
        self.state.lock().calls.clone()
    }

    /// Current block number
    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }
}

fn node_arg(call: &ContractCall) -> Result<Node> {
    match call.args.first() {
        Some(Token::Node(node)) => Ok(*node),
        _ => Err(Error::InvalidArguments {
            method: call.method.clone(),
            reason: "missing node argument".to_string(),
        }),
    }
}

fn arg(call: &ContractCall, position: usize) -> Result<&Token> {
    call.args.get(position).ok_or_else(|| Error::InvalidArguments {
        method: call.method.clone(),
        reason: format!("missing argument {}", position),
    })
}

fn bad_arg(call: &ContractCall, position: usize) -> Error {
    Error::InvalidArguments {
        method: call.method.clone(),
        reason: format!("unexpected value at argument {}", position),
    }
}

fn bytes32(bytes: &[u8]) -> Option<[u8; 32]> {
    bytes.try_into().ok()
}

impl ChainState {
    fn read_registry(&self, call: &ContractCall) -> Result<Token> {
        let node = node_arg(call)?;
        match call.method.as_str() {
            "resolver" => Ok(Token::Address(
                self.resolvers.get(&node).cloned().unwrap_or_else(Address::zero),
            )),
            "owner" => Ok(Token::Address(
                self.owners.get(&node).cloned().unwrap_or_else(Address::zero),
            )),
            other => Err(Error::Transport(format!("Registry has no method {}", other))),
        }
    }

    fn resolver_method(&self, to: &Address, call: &ContractCall) -> Result<ResolverMethod> {
        let interfaces = self
            .interfaces
            .get(to)
            .ok_or_else(|| Error::Transport(format!("No contract deployed at {}", to)))?;

        let method = ResolverMethod::from_name(&call.method);
        let supported = method.map_or(false, |m| match m.spec().record {
            Some(record) => interfaces.contains(&record.interface_id()),
            None => true,
        });

        match method {
            Some(method) if supported => Ok(method),
            _ => Err(Error::UnsupportedRecord {
                method: call.method.clone(),
                reason: format!("resolver {} does not implement it", to),
            }),
        }
    }

    fn read_resolver(&self, to: &Address, call: &ContractCall) -> Result<Token> {
        let method = self.resolver_method(to, call)?;

        if method == ResolverMethod::SupportsInterface {
            return match arg(call, 0)? {
                Token::InterfaceId(id) => Ok(Token::Bool(
                    self.interfaces.get(to).map_or(false, |ids| ids.contains(id)),
                )),
                _ => Err(bad_arg(call, 0)),
            };
        }

        let node = node_arg(call)?;
        let records = self.records.get(&(to.clone(), node)).cloned().unwrap_or_default();

        let token = match method {
            ResolverMethod::Addr => Token::Address(records.addr.unwrap_or_else(Address::zero)),
            ResolverMethod::Pubkey => {
                Token::from(records.pubkey.unwrap_or(PublicKey::new([0; 32], [0; 32])))
            }
            ResolverMethod::Text => match arg(call, 1)? {
                Token::String(key) => {
                    Token::String(records.text.get(key).cloned().unwrap_or_default())
                }
                _ => return Err(bad_arg(call, 1)),
            },
            ResolverMethod::Content => {
                Token::FixedBytes(records.content.unwrap_or_else(|| vec![0; 32]))
            }
            ResolverMethod::Multihash => Token::Bytes(records.multihash.unwrap_or_default()),
            ResolverMethod::Contenthash => Token::Bytes(records.contenthash.unwrap_or_default()),
            other => {
                return Err(Error::Transport(format!(
                    "{} is a write method",
                    other.name()
                )))
            }
        };

        Ok(token)
    }

    fn write_resolver(&mut self, to: &Address, call: &ContractCall) -> Result<()> {
        let method = self.resolver_method(to, call)?;
        let node = node_arg(call)?;
        let records = self.records.entry((to.clone(), node)).or_default();

        match (method, &call.args[1..]) {
            (ResolverMethod::SetAddr, [Token::Address(address)]) => {
                records.addr = Some(address.clone());
            }
            (ResolverMethod::SetPubkey, [Token::FixedBytes(x), Token::FixedBytes(y)]) => {
                match (bytes32(x), bytes32(y)) {
                    (Some(x), Some(y)) => records.pubkey = Some(PublicKey::new(x, y)),
                    _ => return Err(bad_arg(call, 1)),
                }
            }
            (ResolverMethod::SetText, [Token::String(key), Token::String(value)]) => {
                records.text.insert(key.clone(), value.clone());
            }
            (ResolverMethod::SetContent, [Token::FixedBytes(hash)]) => {
                records.content = Some(hash.clone());
            }
            (ResolverMethod::SetMultihash, [Token::Bytes(hash)]) => {
                records.multihash = Some(hash.clone());
            }
            (ResolverMethod::SetContenthash, [Token::Bytes(hash)]) => {
                records.contenthash = Some(hash.clone());
            }
            (method, _) if !method.is_mutation() => {
                return Err(Error::Transport(format!("{} is a read method", method.name())))
            }
            _ => return Err(bad_arg(call, 1)),
        }

        Ok(())
    }
}

#[async_trait]
impl RegistryClient for MemoryChain {
    async fn resolver(&self, node: &Node) -> Result<Address> {
        self.state
            .lock()
            .resolvers
            .get(node)
            .filter(|address| !address.is_zero())
            .cloned()
            .ok_or_else(|| Error::NoResolver(node.to_string()))
    }

    async fn owner(&self, node: &Node) -> Result<Address> {
        Ok(self.state.lock().owners.get(node).cloned().unwrap_or_else(Address::zero))
    }
}

#[async_trait]
impl ContractTransport for MemoryChain {
    async fn call(&self, to: &Address, call: &ContractCall) -> Result<Token> {
        let mut state = self.state.lock();
        state.calls.push((to.clone(), call.clone()));

        if *to == state.registry_address {
            state.read_registry(call)
        } else {
            state.read_resolver(to, call)
        }
    }

    async fn send(
        &self,
        to: &Address,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<SignalStream> {
        let mut state = self.state.lock();
        state.calls.push((to.clone(), call.clone()));
        state.transactions += 1;

        let hash = format!("0x{:064x}", state.transactions);
        debug!(method = %call.method, tx_hash = %hash, from = ?options.from, "In-memory send");

        let mut signals = vec![TransactionSignal::TransactionHash(hash.clone())];

        if let Some(failure) = state.fail_next.take() {
            signals.push(TransactionSignal::Error(failure));
            return Ok(SignalStream::from_signals(signals));
        }

        if let Err(e) = state.write_resolver(to, call) {
            signals.push(TransactionSignal::Error(TransactionFailure::Exception(
                e.to_string(),
            )));
            return Ok(SignalStream::from_signals(signals));
        }

        state.block_number += 1;
        let receipt = Receipt::mined(hash, state.block_number);
        for number in 0..state.confirmations {
            signals.push(TransactionSignal::Confirmation {
                number,
                receipt: receipt.clone(),
            });
        }
        signals.push(TransactionSignal::Receipt(receipt));

        Ok(SignalStream::from_signals(signals))
    }
}
