//! Resolver invocation layer
//!
//! Resolves a name to its resolver contract and dispatches either a read
//! (`query`) or a write (`mutate`) through one generic path per kind.

use crate::contract::{ContractTransport, ResolverHandle, SignalStream};
use crate::lifecycle::{Callback, LifecycleOperation};
use crate::method::ResolverMethod;
use crate::registry::RegistryClient;
use ens_core::{
    EnsConfig, Error, FromToken, NamehashProvider, Node, Receipt, Result, SendOptions, Token,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves names and invokes resolver methods
///
/// Holds no per-call state: every call hashes the name and asks the registry
/// afresh.
#[derive(Clone)]
pub struct ResolverInvoker {
    namehash: Arc<dyn NamehashProvider>,
    registry: Arc<dyn RegistryClient>,
    transport: Arc<dyn ContractTransport>,
    default_send_options: SendOptions,
    confirmation_target: Option<u64>,
}

impl ResolverInvoker {
    /// Create an invoker from its collaborators
    pub fn new(
        namehash: Arc<dyn NamehashProvider>,
        registry: Arc<dyn RegistryClient>,
        transport: Arc<dyn ContractTransport>,
    ) -> Self {
        Self {
            namehash,
            registry,
            transport,
            default_send_options: SendOptions::default(),
            confirmation_target: None,
        }
    }

    /// Apply send defaults and lifecycle settings from `config`
    pub fn with_config(mut self, config: &EnsConfig) -> Self {
        self.default_send_options = config.default_send_options.clone();
        self.confirmation_target = config.lifecycle.confirmation_target;
        self
    }

    /// Registry client
    pub fn registry(&self) -> &Arc<dyn RegistryClient> {
        &self.registry
    }

    /// Compute the node for `name`
    pub fn node(&self, name: &str) -> Result<Node> {
        self.namehash.hash(name)
    }

    /// Look up the resolver responsible for `name`
    pub async fn resolve_resolver(&self, name: &str) -> Result<ResolverHandle> {
        let node = self.node(name)?;
        debug!(name, %node, "Looking up resolver");

        let address = self.registry.resolver(&node).await.map_err(|e| match e {
            Error::NoResolver(_) => Error::NoResolver(name.to_string()),
            other => other,
        })?;

        if address.is_zero() {
            return Err(Error::NoResolver(name.to_string()));
        }

        debug!(name, resolver = %address, "Resolver found");
        Ok(ResolverHandle::new(name, node, address, self.transport.clone()))
    }

    /// Invoke the read method `method` on the resolver for `name`
    ///
    /// `callback`, when given, receives the same outcome the returned future
    /// resolves to, exactly once.
    pub async fn query<T>(
        &self,
        name: &str,
        method: ResolverMethod,
        args: Vec<Token>,
        callback: Option<Callback<T>>,
    ) -> Result<T>
    where
        T: FromToken + Clone + Send + 'static,
    {
        let result = self.call_read(name, method, args).await;

        if let Err(e) = &result {
            debug!(name, method = method.name(), error = %e, "Query failed");
        }
        if let Some(callback) = callback {
            callback(result.clone());
        }

        result
    }

    async fn call_read<T: FromToken>(
        &self,
        name: &str,
        method: ResolverMethod,
        args: Vec<Token>,
    ) -> Result<T> {
        let spec = method.spec();
        if spec.is_mutation() {
            return Err(Error::InvalidArguments {
                method: spec.name.to_string(),
                reason: "write method used as a query".to_string(),
            });
        }

        let handle = self.resolve_resolver(name).await?;
        let call = method.build_call(handle.node(), args)?;
        let token = handle.call(&call).await?;

        if !spec.returns.accepts(&token) {
            return Err(Error::Decode {
                method: spec.name.to_string(),
                expected: spec.returns.name().to_string(),
                got: token.kind().to_string(),
            });
        }

        T::decode(spec.name, token)
    }

    /// Send the write method `method` to the resolver for `name`
    ///
    /// Returns at once with a PENDING operation; resolution and submission
    /// continue on a spawned task. Must be called within a Tokio runtime.
    pub fn mutate(
        &self,
        name: &str,
        method: ResolverMethod,
        args: Vec<Token>,
        options: SendOptions,
        callback: Option<Callback<Receipt>>,
    ) -> LifecycleOperation {
        let operation = LifecycleOperation::with_confirmation_target(
            method.name(),
            callback,
            self.confirmation_target,
        );

        let invoker = self.clone();
        let name = name.to_string();
        let tracked = operation.clone();
        tokio::spawn(async move {
            match invoker.submit(&name, method, args, &options).await {
                Ok(signals) => tracked.drive(signals).await,
                Err(e) => {
                    warn!(name = %name, method = method.name(), error = %e, "Mutation not sent");
                    tracked.fail(e);
                }
            }
        });

        operation
    }

    async fn submit(
        &self,
        name: &str,
        method: ResolverMethod,
        args: Vec<Token>,
        options: &SendOptions,
    ) -> Result<SignalStream> {
        if !method.is_mutation() {
            return Err(Error::InvalidArguments {
                method: method.name().to_string(),
                reason: "read method used as a mutation".to_string(),
            });
        }

        let handle = self.resolve_resolver(name).await?;
        let call = method.build_call(handle.node(), args)?;
        let options = options.merged_over(&self.default_send_options);

        debug!(name, method = method.name(), resolver = %handle.address(), "Sending transaction");
        handle.send(&call, &options).await
    }
}
