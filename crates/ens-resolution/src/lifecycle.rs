//! Lifecycle-tracked operations
//!
//! A [`LifecycleOperation`] is the result of a resolver write. It is both an
//! awaitable resolving to the final [`Receipt`] and an event source
//! broadcasting each milestone (`transactionHash`, `confirmation`, `receipt`,
//! `error`) to any number of subscribers.
//!
//! State machine:
//!
//! ```text
//! PENDING --hash--> SUBMITTED --confirmation--> CONFIRMING --receipt--> SETTLED
//!    |                  |    \-----------receipt---------------------/
//!    +------error-------+--------error-------------+--> FAILED
//! ```
//!
//! Events already fired are replayed to late subscribers, so listeners
//! attached right after the operation is returned never miss one. Once the
//! operation is SETTLED or FAILED it emits nothing further.

use crate::contract::{SignalStream, TransactionSignal};
use ens_core::{Error, Receipt, Result, TransactionState};
use parking_lot::Mutex;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Final-outcome callback, invoked exactly once
pub type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

type Handler = Box<dyn FnMut(&LifecycleEvent) + Send + 'static>;

/// Lifecycle event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// Submission accepted
    TransactionHash,
    /// New confirming block
    Confirmation,
    /// Mined with success status
    Receipt,
    /// Terminal failure
    Error,
}

impl LifecycleEventKind {
    /// Event name
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEventKind::TransactionHash => "transactionHash",
            LifecycleEventKind::Confirmation => "confirmation",
            LifecycleEventKind::Receipt => "receipt",
            LifecycleEventKind::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle milestone
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Submission hash
    TransactionHash(String),
    /// Confirmation count and receipt snapshot
    Confirmation {
        /// Confirmation count, starting at 0
        number: u64,
        /// Receipt snapshot
        receipt: Receipt,
    },
    /// Final receipt
    Receipt(Receipt),
    /// Terminal error
    Error(Error),
}

impl LifecycleEvent {
    /// Event name
    pub fn kind(&self) -> LifecycleEventKind {
        match self {
            LifecycleEvent::TransactionHash(_) => LifecycleEventKind::TransactionHash,
            LifecycleEvent::Confirmation { .. } => LifecycleEventKind::Confirmation,
            LifecycleEvent::Receipt(_) => LifecycleEventKind::Receipt,
            LifecycleEvent::Error(_) => LifecycleEventKind::Error,
        }
    }

    fn from_signal(signal: TransactionSignal) -> Self {
        match signal {
            TransactionSignal::TransactionHash(hash) => LifecycleEvent::TransactionHash(hash),
            TransactionSignal::Confirmation { number, receipt } => {
                LifecycleEvent::Confirmation { number, receipt }
            }
            TransactionSignal::Receipt(receipt) => LifecycleEvent::Receipt(receipt),
            TransactionSignal::Error(failure) => {
                LifecycleEvent::Error(Error::TransactionFailed(failure))
            }
        }
    }
}

/// Ordered event subscription
///
/// Yields every event of the operation, replaying those fired before the
/// subscription was taken, and ends after the terminal event.
#[derive(Debug)]
pub struct LifecycleEvents {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl LifecycleEvents {
    /// Next event, `None` after the terminal event
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    /// Next event if one is buffered
    pub fn try_recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.try_recv().ok()
    }

    /// Collect the remaining events until the terminal one
    pub async fn collect(mut self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            events.push(event);
        }
        events
    }
}

struct Progress {
    state: TransactionState,
    transaction_hash: Option<String>,
    confirmations: u64,
    last_confirmation: Option<u64>,
    latest_receipt: Option<Receipt>,
    callback: Option<Callback<Receipt>>,
}

#[derive(Default)]
struct Dispatch {
    history: Vec<LifecycleEvent>,
    subscribers: Vec<mpsc::UnboundedSender<LifecycleEvent>>,
    closed: bool,
}

struct Shared {
    label: String,
    confirmation_target: Option<u64>,
    progress: Mutex<Progress>,
    dispatch: Mutex<Dispatch>,
    // Locked before `dispatch` and held while handlers run
    handlers: Mutex<Vec<(LifecycleEventKind, Handler)>>,
    outcome: watch::Sender<Option<Result<Receipt>>>,
}

/// Cancellable, observable handle on a sent transaction
///
/// Cloning yields another handle on the same operation.
#[derive(Clone)]
pub struct LifecycleOperation {
    shared: Arc<Shared>,
}

impl LifecycleOperation {
    /// New operation in the PENDING state
    ///
    /// `callback` is invoked once with the final receipt or error, before
    /// the terminal event reaches subscribers.
    pub fn pending(label: impl Into<String>, callback: Option<Callback<Receipt>>) -> Self {
        Self::with_confirmation_target(label, callback, None)
    }

    /// New operation that stops broadcasting confirmations after `target`
    pub fn with_confirmation_target(
        label: impl Into<String>,
        callback: Option<Callback<Receipt>>,
        target: Option<u64>,
    ) -> Self {
        let (outcome, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                label: label.into(),
                confirmation_target: target,
                progress: Mutex::new(Progress {
                    state: TransactionState::Pending,
                    transaction_hash: None,
                    confirmations: 0,
                    last_confirmation: None,
                    latest_receipt: None,
                    callback,
                }),
                dispatch: Mutex::new(Dispatch::default()),
                handlers: Mutex::new(Vec::new()),
                outcome,
            }),
        }
    }

    /// Method label used in logs
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Current state
    pub fn state(&self) -> TransactionState {
        self.shared.progress.lock().state
    }

    /// Submission hash, once SUBMITTED
    pub fn transaction_hash(&self) -> Option<String> {
        self.shared.progress.lock().transaction_hash.clone()
    }

    /// Number of confirmations observed
    pub fn confirmations(&self) -> u64 {
        self.shared.progress.lock().confirmations
    }

    /// Latest receipt snapshot (confirmation, final or failure receipt)
    pub fn latest_receipt(&self) -> Option<Receipt> {
        self.shared.progress.lock().latest_receipt.clone()
    }

    /// Final outcome, once terminal
    pub fn outcome(&self) -> Option<Result<Receipt>> {
        self.shared.outcome.borrow().clone()
    }

    /// Subscribe to every event in order
    pub fn subscribe(&self) -> LifecycleEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut dispatch = self.shared.dispatch.lock();

        for event in &dispatch.history {
            let _ = tx.send(event.clone());
        }
        if !dispatch.closed {
            dispatch.subscribers.push(tx);
        }

        LifecycleEvents { rx }
    }

    /// Attach `handler` to events of `kind`
    ///
    /// The handler runs on the task driving the operation, after any matching
    /// events already fired are replayed to it, and sees each event exactly
    /// once. Handlers may call [`subscribe`](Self::subscribe) and the state
    /// accessors, but must not attach further handlers to the same operation.
    pub fn on<F>(&self, kind: LifecycleEventKind, mut handler: F) -> &Self
    where
        F: FnMut(&LifecycleEvent) + Send + 'static,
    {
        let mut handlers = self.shared.handlers.lock();
        let (replay, closed) = {
            let dispatch = self.shared.dispatch.lock();
            let replay: Vec<_> =
                dispatch.history.iter().filter(|e| e.kind() == kind).cloned().collect();
            (replay, dispatch.closed)
        };

        for event in &replay {
            handler(event);
        }
        if !closed {
            handlers.push((kind, Box::new(handler)));
        }

        self
    }

    /// Attach a handler for the submission hash
    pub fn on_transaction_hash<F>(&self, mut handler: F) -> &Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.on(LifecycleEventKind::TransactionHash, move |event| {
            if let LifecycleEvent::TransactionHash(hash) = event {
                handler(hash);
            }
        })
    }

    /// Attach a handler for confirmations
    pub fn on_confirmation<F>(&self, mut handler: F) -> &Self
    where
        F: FnMut(u64, &Receipt) + Send + 'static,
    {
        self.on(LifecycleEventKind::Confirmation, move |event| {
            if let LifecycleEvent::Confirmation { number, receipt } = event {
                handler(*number, receipt);
            }
        })
    }

    /// Attach a handler for the final receipt
    pub fn on_receipt<F>(&self, mut handler: F) -> &Self
    where
        F: FnMut(&Receipt) + Send + 'static,
    {
        self.on(LifecycleEventKind::Receipt, move |event| {
            if let LifecycleEvent::Receipt(receipt) = event {
                handler(receipt);
            }
        })
    }

    /// Attach a handler for the terminal error
    pub fn on_error<F>(&self, mut handler: F) -> &Self
    where
        F: FnMut(&Error) + Send + 'static,
    {
        self.on(LifecycleEventKind::Error, move |event| {
            if let LifecycleEvent::Error(error) = event {
                handler(error);
            }
        })
    }

    /// Wait for the final receipt or error
    pub async fn wait(&self) -> Result<Receipt> {
        let mut rx = self.shared.outcome.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            Err(_) => None,
        };

        outcome.unwrap_or_else(|| {
            Err(Error::Transport(format!(
                "{} lifecycle ended without an outcome",
                self.shared.label
            )))
        })
    }

    /// Consume transport signals until the operation is terminal
    ///
    /// A stream that ends early fails the operation.
    pub async fn drive(&self, mut signals: SignalStream) {
        while let Some(signal) = signals.next().await {
            self.apply(LifecycleEvent::from_signal(signal));
            if self.state().is_terminal() {
                return;
            }
        }

        if !self.state().is_terminal() {
            warn!(
                method = %self.shared.label,
                "Signal stream closed before the transaction settled"
            );
            self.fail(Error::Transport(
                "signal stream closed before the transaction settled".to_string(),
            ));
        }
    }

    /// Fail the operation. No-op once terminal.
    pub fn fail(&self, error: Error) -> bool {
        self.apply(LifecycleEvent::Error(error))
    }

    /// Apply a lifecycle event
    ///
    /// Returns `false` when the event was ignored: the operation is already
    /// terminal, or the event is out of order (a confirmation or receipt
    /// before the hash, a second hash, a non-increasing confirmation count).
    pub fn apply(&self, event: LifecycleEvent) -> bool {
        let event = match event {
            LifecycleEvent::Receipt(receipt) if !receipt.is_success() => LifecycleEvent::Error(
                Error::TransactionFailed(ens_core::TransactionFailure::Reverted(receipt)),
            ),
            other => other,
        };

        let label = &self.shared.label;
        let (next, broadcast, callback) = {
            let mut progress = self.shared.progress.lock();

            if progress.state.is_terminal() {
                debug!(
                    method = %label,
                    event = %event.kind(),
                    "Ignoring event after terminal state"
                );
                return false;
            }

            let next = match (&event, progress.state) {
                (LifecycleEvent::TransactionHash(_), TransactionState::Pending) => {
                    TransactionState::Submitted
                }
                (
                    LifecycleEvent::Confirmation { .. },
                    TransactionState::Submitted | TransactionState::Confirming,
                ) => TransactionState::Confirming,
                (
                    LifecycleEvent::Receipt(_),
                    TransactionState::Submitted | TransactionState::Confirming,
                ) => TransactionState::Settled,
                (LifecycleEvent::Error(_), _) => TransactionState::Failed,
                (event, state) => {
                    warn!(
                        method = %label,
                        event = %event.kind(),
                        %state,
                        "Ignoring out-of-order event"
                    );
                    return false;
                }
            };

            let mut broadcast = true;
            match &event {
                LifecycleEvent::TransactionHash(hash) => {
                    info!(method = %label, tx_hash = %hash, "Transaction submitted");
                    progress.transaction_hash = Some(hash.clone());
                }
                LifecycleEvent::Confirmation { number, receipt } => {
                    if progress.last_confirmation.is_some_and(|last| *number <= last) {
                        warn!(
                            method = %label,
                            confirmation = number,
                            "Ignoring non-increasing confirmation"
                        );
                        return false;
                    }
                    progress.last_confirmation = Some(*number);
                    progress.confirmations += 1;
                    progress.latest_receipt = Some(receipt.clone());
                    broadcast = self
                        .shared
                        .confirmation_target
                        .map_or(true, |target| progress.confirmations <= target);
                    debug!(
                        method = %label,
                        confirmation = number,
                        broadcast,
                        "Transaction confirmation"
                    );
                }
                LifecycleEvent::Receipt(receipt) => {
                    info!(method = %label, block = ?receipt.block_number, "Transaction settled");
                    progress.latest_receipt = Some(receipt.clone());
                }
                LifecycleEvent::Error(error) => {
                    warn!(method = %label, %error, "Transaction failed");
                    if let Error::TransactionFailed(failure) = error {
                        if let Some(receipt) = failure.receipt() {
                            progress.latest_receipt = Some(receipt.clone());
                        }
                    }
                }
            }

            progress.state = next;
            let callback = if next.is_terminal() {
                progress.callback.take()
            } else {
                None
            };
            (next, broadcast, callback)
        };

        let outcome = match &event {
            LifecycleEvent::Receipt(receipt) => Some(Ok(receipt.clone())),
            LifecycleEvent::Error(error) => Some(Err(error.clone())),
            _ => None,
        };

        if let (Some(callback), Some(outcome)) = (callback, outcome.clone()) {
            callback(outcome);
        }

        if broadcast {
            self.broadcast(event, next.is_terminal());
        }

        if let Some(outcome) = outcome {
            self.shared.outcome.send_replace(Some(outcome));
        }

        true
    }

    fn broadcast(&self, event: LifecycleEvent, terminal: bool) {
        let mut handlers = self.shared.handlers.lock();
        {
            let mut dispatch = self.shared.dispatch.lock();
            dispatch.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
            dispatch.history.push(event.clone());

            if terminal {
                dispatch.closed = true;
                dispatch.subscribers.clear();
            }
        }

        let kind = event.kind();
        for (_, handler) in handlers.iter_mut().filter(|(k, _)| *k == kind) {
            handler(&event);
        }
        if terminal {
            handlers.clear();
        }
    }
}

impl fmt::Debug for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = self.shared.progress.lock();
        f.debug_struct("LifecycleOperation")
            .field("method", &self.shared.label)
            .field("state", &progress.state)
            .field("transaction_hash", &progress.transaction_hash)
            .field("confirmations", &progress.confirmations)
            .finish()
    }
}

impl IntoFuture for LifecycleOperation {
    type Output = Result<Receipt>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<Receipt>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}
