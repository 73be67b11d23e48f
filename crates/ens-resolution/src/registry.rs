//! Registry client
//!
//! Maps a node to the resolver contract responsible for it.

use crate::contract::{ContractCall, ContractTransport};
use async_trait::async_trait;
use ens_core::{Address, Error, FromToken, Node, Result, Token};
use std::sync::Arc;
use tracing::debug;

/// Registry lookups
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Resolver address for `node`. Fails with [`Error::NoResolver`] when
    /// none is set.
    async fn resolver(&self, node: &Node) -> Result<Address>;

    /// Owner of `node`. The zero address means the node is unowned.
    async fn owner(&self, node: &Node) -> Result<Address>;
}

/// Registry client backed by the registry contract
pub struct ContractRegistry {
    address: Address,
    transport: Arc<dyn ContractTransport>,
}

impl ContractRegistry {
    /// Registry contract at `address`, reached through `transport`
    pub fn new(address: Address, transport: Arc<dyn ContractTransport>) -> Self {
        Self { address, transport }
    }

    /// Registry contract address
    pub fn address(&self) -> &Address {
        &self.address
    }

    async fn read_address(&self, method: &str, node: &Node) -> Result<Address> {
        let call = ContractCall::new(method, vec![Token::Node(*node)]);
        let token = self.transport.call(&self.address, &call).await?;
        Address::decode(method, token)
    }
}

#[async_trait]
impl RegistryClient for ContractRegistry {
    async fn resolver(&self, node: &Node) -> Result<Address> {
        let resolver = self.read_address("resolver", node).await?;

        if resolver.is_zero() {
            debug!(%node, "Registry returned zero resolver");
            return Err(Error::NoResolver(node.to_string()));
        }

        Ok(resolver)
    }

    async fn owner(&self, node: &Node) -> Result<Address> {
        self.read_address("owner", node).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::SignalStream;
    use ens_core::SendOptions;
    use parking_lot::Mutex;

    struct FixedTransport {
        reply: Token,
        seen: Mutex<Vec<(Address, ContractCall)>>,
    }

    #[async_trait]
    impl ContractTransport for FixedTransport {
        async fn call(&self, to: &Address, call: &ContractCall) -> Result<Token> {
            self.seen.lock().push((to.clone(), call.clone()));
            Ok(self.reply.clone())
        }

        async fn send(
            &self,
            _to: &Address,
            _call: &ContractCall,
            _options: &SendOptions,
        ) -> Result<SignalStream> {
            Err(Error::Transport("read-only".to_string()))
        }
    }

    fn registry(reply: Token) -> (ContractRegistry, Arc<FixedTransport>) {
        let transport = Arc::new(FixedTransport {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let registry = ContractRegistry::new(Address::new("0xe7"), transport.clone());
        (registry, transport)
    }

    #[tokio::test]
    async fn test_resolver_reads_registry_contract() {
        let (registry, transport) = registry(Token::Address(Address::new("0x42")));
        let node = Node::from_bytes([9; 32]);

        let resolver = registry.resolver(&node).await.unwrap();
        assert_eq!(resolver, Address::new("0x42"));

        let seen = transport.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Address::new("0xe7"));
        assert_eq!(seen[0].1, ContractCall::new("resolver", vec![Token::Node(node)]));
    }

    #[tokio::test]
    async fn test_zero_resolver_is_no_resolver() {
        let (registry, _) = registry(Token::Address(Address::zero()));
        let err = registry.resolver(&Node::ROOT).await.unwrap_err();
        assert!(matches!(err, Error::NoResolver(_)));
    }

    #[tokio::test]
    async fn test_zero_owner_is_returned() {
        let (registry, _) = registry(Token::Address(Address::zero()));
        let owner = registry.owner(&Node::ROOT).await.unwrap();
        assert!(owner.is_zero());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_decode_error() {
        let (registry, _) = registry(Token::Bool(true));
        let err = registry.resolver(&Node::ROOT).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
