//! Error types for ENS resolution
//!
//! Error taxonomy shared by name hashing, registry lookup, resolver
//! invocation and transaction lifecycle tracking.

use crate::transaction::TransactionFailure;
use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// ENS resolution errors
///
/// `Clone`: a mutation's terminal error reaches the awaiting future, each
/// event subscriber and the optional callback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Name rejected by the namehash provider
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Registry has no resolver for the name
    #[error("No resolver set for {0}")]
    NoResolver(String),

    /// Resolver does not implement the requested record method
    #[error("Unsupported record method {method}: {reason}")]
    UnsupportedRecord {
        /// Resolver method name
        method: String,
        /// Failure reported by the contract layer
        reason: String,
    },

    /// Mutation reached the failed state
    #[error("Transaction failed: {0}")]
    TransactionFailed(TransactionFailure),

    /// Transport or contract call failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Contract returned a value of an unexpected shape
    #[error("Decode error in {method}: expected {expected}, got {got}")]
    Decode {
        /// Resolver method name
        method: String,
        /// Expected value shape
        expected: String,
        /// Actual value shape
        got: String,
    },

    /// Arguments do not match the method signature
    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments {
        /// Resolver method name
        method: String,
        /// Mismatch description
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Whether the error happened while resolving the resolver, before any
    /// contract method was invoked
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Error::InvalidName(_) | Error::NoResolver(_))
    }

    /// Whether the error is the terminal failure of a sent transaction
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, Error::TransactionFailed(_))
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidName(_) => ErrorCategory::Name,
            Error::NoResolver(_) => ErrorCategory::Resolution,
            Error::UnsupportedRecord { .. }
            | Error::Decode { .. }
            | Error::InvalidArguments { .. } => ErrorCategory::Record,
            Error::TransactionFailed(_) => ErrorCategory::Transaction,
            Error::Transport(_) => ErrorCategory::Transport,
            Error::Config(_) => ErrorCategory::Config,
            Error::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Name hashing errors
    Name,
    /// Registry lookup errors
    Resolution,
    /// Record method errors
    Record,
    /// Transaction lifecycle errors
    Transaction,
    /// Transport errors
    Transport,
    /// Configuration errors
    Config,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Name => write!(f, "Name"),
            ErrorCategory::Resolution => write!(f, "Resolution"),
            ErrorCategory::Record => write!(f, "Record"),
            ErrorCategory::Transaction => write!(f, "Transaction"),
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}
