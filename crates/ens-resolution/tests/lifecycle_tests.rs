//! Lifecycle tests driven by a manually controlled signal channel

use async_trait::async_trait;
use ens_resolution::{
    Address, ContractCall, ContractTransport, Ens, EnsConfig, EnsNamehash, Error, LifecycleEvent,
    LifecycleEventKind, MemoryChain, Receipt, Result, SendOptions, SignalSender, SignalStream,
    Token, TransactionFailure, TransactionSignal, TransactionState,
};
use ens_resolution::{NamehashProvider, RegistryClient};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Transport handing each send's sender half to the test
struct ChannelTransport {
    senders: Mutex<Option<oneshot::Sender<SignalSender>>>,
}

impl ChannelTransport {
    fn new() -> (Arc<Self>, oneshot::Receiver<SignalSender>) {
        let (tx, rx) = oneshot::channel();
        let transport = Arc::new(Self {
            senders: Mutex::new(Some(tx)),
        });
        (transport, rx)
    }
}

#[async_trait]
impl ContractTransport for ChannelTransport {
    async fn call(&self, _to: &Address, _call: &ContractCall) -> Result<Token> {
        Err(Error::Transport("write-only".to_string()))
    }

    async fn send(
        &self,
        _to: &Address,
        _call: &ContractCall,
        _options: &SendOptions,
    ) -> Result<SignalStream> {
        let (sender, stream) = SignalStream::channel();
        if let Some(tx) = self.senders.lock().take() {
            let _ = tx.send(sender);
        }
        Ok(stream)
    }
}

async fn ens_with_channel(config: EnsConfig) -> (Ens, oneshot::Receiver<SignalSender>) {
    let chain = MemoryChain::new();
    let node = EnsNamehash.hash("alice.eth").unwrap();
    chain.set_resolver(node, Address::new("0x51"));
    assert!(chain.resolver(&node).await.is_ok());

    let (transport, rx) = ChannelTransport::new();
    let ens = Ens::new(Arc::new(EnsNamehash), Arc::new(chain), transport, config).unwrap();
    (ens, rx)
}

fn confirmation(number: u64) -> TransactionSignal {
    TransactionSignal::Confirmation {
        number,
        receipt: Receipt::mined("0xabc", 10 + number),
    }
}

#[tokio::test]
async fn test_operation_is_pending_until_hash() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_text("alice.eth", "url", "https://alice.example").send();
    assert_eq!(op.state(), TransactionState::Pending);

    let sender = rx.await.unwrap();
    assert_eq!(op.state(), TransactionState::Pending);

    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    let mut events = op.subscribe();
    assert_eq!(
        events.recv().await,
        Some(LifecycleEvent::TransactionHash("0xabc".to_string()))
    );
    assert_eq!(op.state(), TransactionState::Submitted);
    assert_eq!(op.transaction_hash().as_deref(), Some("0xabc"));

    sender.send(confirmation(0));
    assert_eq!(events.recv().await.map(|e| e.kind()), Some(LifecycleEventKind::Confirmation));
    assert_eq!(op.state(), TransactionState::Confirming);

    sender.send(TransactionSignal::Receipt(Receipt::mined("0xabc", 10)));
    assert_eq!(op.wait().await.unwrap(), Receipt::mined("0xabc", 10));
    assert_eq!(op.state(), TransactionState::Settled);
    assert_eq!(events.recv().await.map(|e| e.kind()), Some(LifecycleEventKind::Receipt));
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn test_many_subscribers_see_same_order() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_address("alice.eth", Address::zero()).send();

    let early = op.subscribe();
    let order = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        LifecycleEventKind::TransactionHash,
        LifecycleEventKind::Confirmation,
        LifecycleEventKind::Receipt,
        LifecycleEventKind::Error,
    ] {
        let order = order.clone();
        op.on(kind, move |event| order.lock().push(event.kind()));
    }

    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    sender.send(confirmation(0));
    sender.send(confirmation(1));
    sender.send(TransactionSignal::Receipt(Receipt::mined("0xabc", 10)));
    op.wait().await.unwrap();

    let late = op.subscribe();
    let early = early.collect().await;
    assert_eq!(early, late.collect().await);
    assert_eq!(
        *order.lock(),
        early.iter().map(LifecycleEvent::kind).collect::<Vec<_>>()
    );
    assert_eq!(early.len(), 4);
}

#[tokio::test]
async fn test_signals_after_terminal_are_dropped() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_content("alice.eth", [1; 32]).send();

    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    sender.send(TransactionSignal::Error(TransactionFailure::Exception(
        "out of gas".to_string(),
    )));
    sender.send(confirmation(0));
    sender.send(TransactionSignal::Receipt(Receipt::mined("0xabc", 10)));

    let err = op.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "Transaction failed: out of gas");
    assert_eq!(op.state(), TransactionState::Failed);

    let kinds: Vec<_> = op.subscribe().collect().await.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![LifecycleEventKind::TransactionHash, LifecycleEventKind::Error]
    );
}

#[tokio::test]
async fn test_reverted_receipt_fails_with_receipt() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_multihash("alice.eth", vec![1, 2]).send();

    let mut reverted = Receipt::mined("0xabc", 10);
    reverted.status = Some(false);

    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    sender.send(TransactionSignal::Receipt(reverted.clone()));

    let err = op.wait().await.unwrap_err();
    assert_eq!(
        err,
        Error::TransactionFailed(TransactionFailure::Reverted(reverted.clone()))
    );
    assert!(err.is_transaction_failure());
    assert_eq!(op.latest_receipt(), Some(reverted));
}

#[tokio::test]
async fn test_dropped_sender_fails_operation() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_contenthash("alice.eth", vec![1]).send();

    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    drop(sender);

    assert!(matches!(op.wait().await, Err(Error::Transport(_))));
    assert_eq!(op.state(), TransactionState::Failed);
}

#[tokio::test]
async fn test_confirmation_target_from_config() {
    let mut config = EnsConfig::default();
    config.lifecycle.confirmation_target = Some(1);
    let (ens, rx) = ens_with_channel(config).await;
    let op = ens.set_pubkey("alice.eth", [1; 32], [2; 32]).send();

    let confirmations = Arc::new(Mutex::new(Vec::new()));
    let sink = confirmations.clone();
    op.on_confirmation(move |number, _| sink.lock().push(number));

    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));
    for n in 0..3 {
        sender.send(confirmation(n));
    }
    sender.send(TransactionSignal::Receipt(Receipt::mined("0xabc", 12)));

    op.wait().await.unwrap();
    assert_eq!(*confirmations.lock(), vec![0]);
    assert_eq!(op.confirmations(), 3);
    assert_eq!(op.latest_receipt(), Some(Receipt::mined("0xabc", 12)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_blocks_until_receipt() {
    let (ens, rx) = ens_with_channel(EnsConfig::default()).await;
    let op = ens.set_text("alice.eth", "k", "v").send();
    let sender = rx.await.unwrap();
    sender.send(TransactionSignal::TransactionHash("0xabc".to_string()));

    let waiting = tokio::time::timeout(Duration::from_secs(30), op.wait()).await;
    assert!(waiting.is_err());
    assert_eq!(op.outcome(), None);

    sender.send(TransactionSignal::Receipt(Receipt::mined("0xabc", 10)));
    assert!(op.clone().await.is_ok());
}
