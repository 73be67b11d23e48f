//! Record accessors
//!
//! One method per resolver record. Reads return a [`QueryCall`] that can be
//! awaited directly; writes return a [`MutationCall`] that is sent with
//! [`MutationCall::send`] (or awaited for the receipt).
//!
//! ```ignore
//! let address = ens.get_address("alice.eth").await?;
//!
//! let op = ens.set_text("alice.eth", "url", "https://alice.example")
//!     .options(SendOptions::new().from(owner))
//!     .send();
//! op.on_transaction_hash(|hash| println!("submitted {}", hash));
//! let receipt = op.await?;
//! ```

use crate::contract::{ContractTransport, ResolverHandle};
use crate::invoker::ResolverInvoker;
use crate::lifecycle::{Callback, LifecycleOperation};
use crate::method::ResolverMethod;
use crate::registry::{ContractRegistry, RegistryClient};
use ens_core::{
    Address, EnsConfig, FromToken, InterfaceId, NamehashProvider, PublicKey, Receipt, RecordKind,
    Result, SendOptions, Token,
};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

/// ENS client
#[derive(Clone)]
pub struct Ens {
    invoker: ResolverInvoker,
    config: EnsConfig,
}

impl Ens {
    /// Create a client from its collaborators
    pub fn new(
        namehash: Arc<dyn NamehashProvider>,
        registry: Arc<dyn RegistryClient>,
        transport: Arc<dyn ContractTransport>,
        config: EnsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let invoker = ResolverInvoker::new(namehash, registry, transport).with_config(&config);
        Ok(Self { invoker, config })
    }

    /// Create a client whose registry is the contract at
    /// `config.registry_address`, reached through `transport`
    pub fn with_contract_registry(
        namehash: Arc<dyn NamehashProvider>,
        transport: Arc<dyn ContractTransport>,
        config: EnsConfig,
    ) -> Result<Self> {
        let registry = Arc::new(ContractRegistry::new(
            config.registry_address.clone(),
            transport.clone(),
        ));
        Self::new(namehash, registry, transport, config)
    }

    /// Registry client
    pub fn registry(&self) -> &Arc<dyn RegistryClient> {
        self.invoker.registry()
    }

    /// Client configuration
    pub fn config(&self) -> &EnsConfig {
        &self.config
    }

    /// Underlying invocation layer
    pub fn invoker(&self) -> &ResolverInvoker {
        &self.invoker
    }

    /// Resolver contract for `name`
    pub async fn resolver(&self, name: &str) -> Result<ResolverHandle> {
        self.invoker.resolve_resolver(name).await
    }

    /// Registry owner of `name`
    pub async fn owner(&self, name: &str) -> Result<Address> {
        let node = self.invoker.node(name)?;
        self.registry().owner(&node).await
    }

    /// Whether the resolver for `name` implements `interface_id`
    pub fn supports_interface(&self, name: &str, interface_id: InterfaceId) -> QueryCall<'_, bool> {
        self.query(
            name,
            ResolverMethod::SupportsInterface,
            vec![Token::InterfaceId(interface_id)],
        )
    }

    /// Whether the resolver for `name` serves `record`
    pub fn supports_record(&self, name: &str, record: RecordKind) -> QueryCall<'_, bool> {
        self.supports_interface(name, record.interface_id())
    }

    /// Address record
    pub fn get_address(&self, name: &str) -> QueryCall<'_, Address> {
        self.query(name, ResolverMethod::Addr, vec![])
    }

    /// Set the address record
    pub fn set_address(&self, name: &str, address: Address) -> MutationCall {
        self.mutation(name, ResolverMethod::SetAddr, vec![Token::Address(address)])
    }

    /// Public key record
    pub fn get_pubkey(&self, name: &str) -> QueryCall<'_, PublicKey> {
        self.query(name, ResolverMethod::Pubkey, vec![])
    }

    /// Set the public key record from its coordinates
    pub fn set_pubkey(&self, name: &str, x: [u8; 32], y: [u8; 32]) -> MutationCall {
        self.mutation(
            name,
            ResolverMethod::SetPubkey,
            vec![Token::FixedBytes(x.to_vec()), Token::FixedBytes(y.to_vec())],
        )
    }

    /// Text record under `key`
    pub fn get_text(&self, name: &str, key: &str) -> QueryCall<'_, String> {
        self.query(name, ResolverMethod::Text, vec![Token::String(key.to_string())])
    }

    /// Set the text record under `key`
    pub fn set_text(&self, name: &str, key: &str, value: &str) -> MutationCall {
        self.mutation(
            name,
            ResolverMethod::SetText,
            vec![Token::String(key.to_string()), Token::String(value.to_string())],
        )
    }

    /// Legacy content record
    pub fn get_content(&self, name: &str) -> QueryCall<'_, Vec<u8>> {
        self.query(name, ResolverMethod::Content, vec![])
    }

    /// Set the legacy content record
    pub fn set_content(&self, name: &str, hash: [u8; 32]) -> MutationCall {
        self.mutation(name, ResolverMethod::SetContent, vec![Token::FixedBytes(hash.to_vec())])
    }

    /// Multihash record
    pub fn get_multihash(&self, name: &str) -> QueryCall<'_, Vec<u8>> {
        self.query(name, ResolverMethod::Multihash, vec![])
    }

    /// Set the multihash record
    pub fn set_multihash(&self, name: &str, hash: impl Into<Vec<u8>>) -> MutationCall {
        self.mutation(name, ResolverMethod::SetMultihash, vec![Token::Bytes(hash.into())])
    }

    /// Content hash record
    pub fn get_contenthash(&self, name: &str) -> QueryCall<'_, Vec<u8>> {
        self.query(name, ResolverMethod::Contenthash, vec![])
    }

    /// Set the content hash record
    pub fn set_contenthash(&self, name: &str, hash: impl Into<Vec<u8>>) -> MutationCall {
        self.mutation(name, ResolverMethod::SetContenthash, vec![Token::Bytes(hash.into())])
    }

    fn query<T>(&self, name: &str, method: ResolverMethod, args: Vec<Token>) -> QueryCall<'_, T> {
        QueryCall {
            invoker: &self.invoker,
            name: name.to_string(),
            method,
            args,
            callback: None,
        }
    }

    fn mutation(&self, name: &str, method: ResolverMethod, args: Vec<Token>) -> MutationCall {
        MutationCall {
            invoker: self.invoker.clone(),
            name: name.to_string(),
            method,
            args,
            options: SendOptions::default(),
            callback: None,
        }
    }
}

/// A pending record read
#[must_use = "a query does nothing until awaited"]
pub struct QueryCall<'a, T> {
    invoker: &'a ResolverInvoker,
    name: String,
    method: ResolverMethod,
    args: Vec<Token>,
    callback: Option<Callback<T>>,
}

impl<'a, T> QueryCall<'a, T> {
    /// Also deliver the outcome to `callback`
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Resolver method this read invokes
    pub fn method(&self) -> ResolverMethod {
        self.method
    }
}

impl<'a, T> IntoFuture for QueryCall<'a, T>
where
    T: FromToken + Clone + Send + 'static,
{
    type Output = Result<T>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.invoker
                .query(&self.name, self.method, self.args, self.callback)
                .await
        })
    }
}

/// A pending record write
#[must_use = "a mutation does nothing until sent or awaited"]
pub struct MutationCall {
    invoker: ResolverInvoker,
    name: String,
    method: ResolverMethod,
    args: Vec<Token>,
    options: SendOptions,
    callback: Option<Callback<Receipt>>,
}

impl MutationCall {
    /// Per-call send options, merged over the configured defaults
    pub fn options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    /// Also deliver the final receipt or error to `callback`
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<Receipt>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Resolver method this write invokes
    pub fn method(&self) -> ResolverMethod {
        self.method
    }

    /// Start the write and return its lifecycle handle
    ///
    /// Must be called within a Tokio runtime.
    pub fn send(self) -> LifecycleOperation {
        self.invoker
            .mutate(&self.name, self.method, self.args, self.options, self.callback)
    }
}

impl IntoFuture for MutationCall {
    type Output = Result<Receipt>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<Receipt>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        self.send().into_future()
    }
}
