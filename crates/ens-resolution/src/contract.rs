//! Contract invocation capability
//!
//! The transport owns ABI encoding, signing and submission. This layer hands
//! it a method name with decoded arguments and receives either a decoded
//! return value (reads) or a stream of lifecycle signals (writes).

use async_trait::async_trait;
use ens_core::{Address, Node, Receipt, Result, SendOptions, Token, TransactionFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A contract method invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Method name
    pub method: String,
    /// Positional arguments
    pub args: Vec<Token>,
}

impl ContractCall {
    /// Create a call
    pub fn new(method: impl Into<String>, args: Vec<Token>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Signal emitted by the transport for a sent transaction
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionSignal {
    /// Submission accepted, carries the transaction hash
    TransactionHash(String),
    /// A new confirming block
    Confirmation {
        /// Confirmation count, starting at 0
        number: u64,
        /// Receipt snapshot at this confirmation
        receipt: Receipt,
    },
    /// Transaction mined
    Receipt(Receipt),
    /// Submission or mining failed
    Error(TransactionFailure),
}

/// Receiving half of a transaction's signal channel
#[derive(Debug)]
pub struct SignalStream {
    rx: mpsc::UnboundedReceiver<TransactionSignal>,
}

/// Sending half of a transaction's signal channel
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<TransactionSignal>,
}

impl SignalStream {
    /// Create a connected sender/stream pair
    pub fn channel() -> (SignalSender, SignalStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SignalSender { tx }, SignalStream { rx })
    }

    /// Stream that yields `signals` and then ends
    pub fn from_signals(signals: impl IntoIterator<Item = TransactionSignal>) -> Self {
        let (sender, stream) = Self::channel();
        for signal in signals {
            sender.send(signal);
        }
        stream
    }

    /// Next signal, `None` once every sender is gone and the buffer is drained
    pub async fn next(&mut self) -> Option<TransactionSignal> {
        self.rx.recv().await
    }
}

impl SignalSender {
    /// Push a signal. Returns `false` if the stream was dropped.
    pub fn send(&self, signal: TransactionSignal) -> bool {
        self.tx.send(signal).is_ok()
    }

    /// True when the receiving stream was dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Contract invocation capability
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Read-only call of `call` on the contract at `to`
    async fn call(&self, to: &Address, call: &ContractCall) -> Result<Token>;

    /// State-changing send of `call` to the contract at `to`
    ///
    /// An `Err` means the send could not be issued at all. Failures after
    /// issue arrive as [`TransactionSignal::Error`] on the stream.
    async fn send(
        &self,
        to: &Address,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<SignalStream>;
}

/// A resolver contract bound to the node it was looked up for
#[derive(Clone)]
pub struct ResolverHandle {
    name: String,
    node: Node,
    address: Address,
    transport: Arc<dyn ContractTransport>,
}

impl ResolverHandle {
    /// Bind a resolver address to a name and node
    pub fn new(
        name: impl Into<String>,
        node: Node,
        address: Address,
        transport: Arc<dyn ContractTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            node,
            address,
            transport,
        }
    }

    /// Name the handle was resolved for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node used for the registry lookup
    pub fn node(&self) -> Node {
        self.node
    }

    /// Resolver contract address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Read-only call on the resolver
    pub async fn call(&self, call: &ContractCall) -> Result<Token> {
        self.transport.call(&self.address, call).await
    }

    /// State-changing send to the resolver
    pub async fn send(&self, call: &ContractCall, options: &SendOptions) -> Result<SignalStream> {
        self.transport.send(&self.address, call, options).await
    }
}

impl fmt::Debug for ResolverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverHandle")
            .field("name", &self.name)
            .field("node", &self.node)
            .field("address", &self.address)
            .finish()
    }
}
