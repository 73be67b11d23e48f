//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ens_resolution::{
    Address, ContractCall, ContractTransport, Ens, EnsConfig, Error, NamehashProvider, Node,
    Receipt, RegistryClient, Result, SendOptions, SignalStream, Token, TransactionFailure,
    TransactionSignal,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolver address every test name resolves to
pub const RESOLVER: &str = "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41";

/// Node the recording namehash returns for every name
pub const NODE: Node = Node::from_bytes([0x11; 32]);

/// Namehash that records every name it is asked about
#[derive(Default)]
pub struct RecordingNamehash {
    pub names: Mutex<Vec<String>>,
}

impl NamehashProvider for RecordingNamehash {
    fn hash(&self, name: &str) -> Result<Node> {
        self.names.lock().push(name.to_string());
        if name.is_empty() {
            return Err(Error::InvalidName("empty name".to_string()));
        }
        Ok(NODE)
    }
}

/// Registry with at most one resolver, counting lookups
pub struct RecordingRegistry {
    pub resolver: Option<Address>,
    pub lookups: Mutex<Vec<Node>>,
}

impl RecordingRegistry {
    pub fn with_resolver(resolver: Option<&str>) -> Self {
        Self {
            resolver: resolver.map(Address::new),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RegistryClient for RecordingRegistry {
    async fn resolver(&self, node: &Node) -> Result<Address> {
        self.lookups.lock().push(*node);
        self.resolver
            .clone()
            .ok_or_else(|| Error::NoResolver(node.to_string()))
    }

    async fn owner(&self, _node: &Node) -> Result<Address> {
        Ok(Address::new("0x00000000000000000000000000000000000000aa"))
    }
}

/// How the scripted transport reports a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendScript {
    /// hash, confirmation(0, {}), receipt({})
    Success,
    /// hash, confirmation(0, {}), error(rejected)
    Rejected,
}

/// Transport returning canned replies and scripted lifecycles
pub struct ScriptedTransport {
    pub replies: Mutex<HashMap<String, Token>>,
    pub script: Mutex<SendScript>,
    pub calls: Mutex<Vec<(Address, ContractCall)>>,
    pub sends: Mutex<Vec<(Address, ContractCall, SendOptions)>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            script: Mutex::new(SendScript::Success),
            calls: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedTransport {
    pub fn reply(&self, method: &str, token: Token) {
        self.replies.lock().insert(method.to_string(), token);
    }

    pub fn script(&self, script: SendScript) {
        *self.script.lock() = script;
    }

    /// Every method invoked on the resolver, reads and writes
    pub fn invoked(&self) -> usize {
        self.calls.lock().len() + self.sends.lock().len()
    }
}

#[async_trait]
impl ContractTransport for ScriptedTransport {
    async fn call(&self, to: &Address, call: &ContractCall) -> Result<Token> {
        self.calls.lock().push((to.clone(), call.clone()));
        self.replies
            .lock()
            .get(&call.method)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("no reply scripted for {}", call.method)))
    }

    async fn send(
        &self,
        to: &Address,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<SignalStream> {
        self.sends
            .lock()
            .push((to.clone(), call.clone(), options.clone()));

        let last = match *self.script.lock() {
            SendScript::Success => TransactionSignal::Receipt(Receipt::default()),
            SendScript::Rejected => TransactionSignal::Error(TransactionFailure::Rejected),
        };

        Ok(SignalStream::from_signals(vec![
            TransactionSignal::TransactionHash("0xhash".to_string()),
            TransactionSignal::Confirmation {
                number: 0,
                receipt: Receipt::default(),
            },
            last,
        ]))
    }
}

/// Facade wired to fresh doubles
pub struct Harness {
    pub ens: Ens,
    pub namehash: Arc<RecordingNamehash>,
    pub registry: Arc<RecordingRegistry>,
    pub transport: Arc<ScriptedTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_resolver(Some(RESOLVER))
    }

    pub fn with_resolver(resolver: Option<&str>) -> Self {
        let namehash = Arc::new(RecordingNamehash::default());
        let registry = Arc::new(RecordingRegistry::with_resolver(resolver));
        let transport = Arc::new(ScriptedTransport::default());
        let ens = Ens::new(
            namehash.clone(),
            registry.clone(),
            transport.clone(),
            EnsConfig::default(),
        )
        .unwrap();

        Self {
            ens,
            namehash,
            registry,
            transport,
        }
    }

    pub fn last_send(&self) -> (Address, ContractCall, SendOptions) {
        self.transport.sends.lock().last().cloned().unwrap()
    }

    pub fn last_call(&self) -> (Address, ContractCall) {
        self.transport.calls.lock().last().cloned().unwrap()
    }
}
