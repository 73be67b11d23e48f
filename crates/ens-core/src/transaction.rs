//! Transaction types
//!
//! Send options handed to the transport, the receipt it reports and the
//! failure payloads it can emit.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Options for a state-changing send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// Sending account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Gas limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Gas price in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    /// Value in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u128>,
    /// Explicit nonce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

impl SendOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sending account
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the gas limit
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Set the gas price
    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill unset fields from `defaults`. Fields set on `self` win.
    pub fn merged_over(&self, defaults: &SendOptions) -> SendOptions {
        SendOptions {
            from: self.from.clone().or_else(|| defaults.from.clone()),
            gas: self.gas.or(defaults.gas),
            gas_price: self.gas_price.or(defaults.gas_price),
            value: self.value.or(defaults.value),
            nonce: self.nonce.or(defaults.nonce),
        }
    }
}

/// Transaction receipt as reported by the transport
///
/// Fields the transport reports beyond the typed ones are kept in `extra`.
/// `Receipt::default()` is the empty receipt `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Transaction hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// Block the transaction was mined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Execution status, `Some(false)` for a reverted transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    /// Remaining receipt fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Receipt {
    /// Receipt for a mined transaction
    pub fn mined(transaction_hash: impl Into<String>, block_number: u64) -> Self {
        Self {
            transaction_hash: Some(transaction_hash.into()),
            block_number: Some(block_number),
            status: Some(true),
            extra: BTreeMap::new(),
        }
    }

    /// A receipt without an explicit failure status counts as successful
    pub fn is_success(&self) -> bool {
        self.status != Some(false)
    }
}

/// Terminal failure payload of a sent transaction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransactionFailure {
    /// Transport signalled a bare failure with no further detail
    #[error("transaction rejected")]
    Rejected,

    /// Transaction was mined but reverted
    #[error("transaction reverted{}", block_suffix(.0))]
    Reverted(Receipt),

    /// Submission or mining raised an exception
    #[error("{0}")]
    Exception(String),
}

fn block_suffix(receipt: &Receipt) -> String {
    match receipt.block_number {
        Some(block) => format!(" in block {}", block),
        None => String::new(),
    }
}

impl TransactionFailure {
    /// Failure receipt, when the transaction was mined
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            TransactionFailure::Reverted(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Lifecycle state of a sent transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// Waiting for resolution and submission
    Pending,
    /// Submission accepted, hash known
    Submitted,
    /// At least one confirmation observed
    Confirming,
    /// Receipt received with success status
    Settled,
    /// Terminal failure
    Failed,
}

impl TransactionState {
    /// Is the state terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Settled | TransactionState::Failed)
    }

    /// Is the transaction settled successfully
    pub fn is_successful(&self) -> bool {
        matches!(self, TransactionState::Settled)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Pending => "PENDING",
            TransactionState::Submitted => "SUBMITTED",
            TransactionState::Confirming => "CONFIRMING",
            TransactionState::Settled => "SETTLED",
            TransactionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_receipt_serializes_to_empty_object() {
        let json = serde_json::to_string(&Receipt::default()).unwrap();
        assert_eq!(json, "{}");

        let parsed: Receipt = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, Receipt::default());
    }

    #[test]
    fn test_receipt_keeps_unknown_fields() {
        let json = r#"{"transactionHash":"0xabc","blockNumber":7,"gasUsed":21000}"#;
        let receipt: Receipt = serde_json::from_str(json).unwrap();

        assert_eq!(receipt.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(receipt.block_number, Some(7));
        assert_eq!(receipt.extra.get("gasUsed"), Some(&serde_json::json!(21000)));
        assert!(receipt.is_success());
    }

    #[test]
    fn test_receipt_status() {
        let mut receipt = Receipt::mined("0x1", 1);
        assert!(receipt.is_success());

        receipt.status = Some(false);
        assert!(!receipt.is_success());
    }

    #[test]
    fn test_send_options_merge() {
        let defaults = SendOptions::new()
            .from(Address::new("0x00000000000000000000000000000000000000aa"))
            .gas(100_000);
        let per_call = SendOptions::new().gas(50_000).gas_price(7);

        let merged = per_call.merged_over(&defaults);
        assert_eq!(merged.gas, Some(50_000));
        assert_eq!(merged.gas_price, Some(7));
        assert_eq!(merged.from, defaults.from);
        assert!(SendOptions::new().is_empty());
        assert!(!merged.is_empty());
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(TransactionFailure::Rejected.to_string(), "transaction rejected");

        let mut receipt = Receipt::mined("0x1", 12);
        receipt.status = Some(false);
        let failure = TransactionFailure::Reverted(receipt.clone());
        assert_eq!(failure.to_string(), "transaction reverted in block 12");
        assert_eq!(failure.receipt(), Some(&receipt));
        assert!(TransactionFailure::Rejected.receipt().is_none());
    }

    #[test]
    fn test_state_terminal() {
        assert!(TransactionState::Settled.is_terminal());
        assert!(TransactionState::Failed.is_terminal());
        assert!(!TransactionState::Confirming.is_terminal());
        assert!(TransactionState::Settled.is_successful());
        assert!(!TransactionState::Failed.is_successful());
        assert_eq!(TransactionState::Pending.to_string(), "PENDING");
    }
}
