//! Error taxonomy for adapter conformance runs
//!
//! Configuration and transport errors abort a run. Invariant violations are
//! reported per scenario and the sweep continues. Reverts are raw chain
//! outcomes that callers turn into one of the other three.

use alloy::primitives::{Address, Bytes, U256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// Wrong constant, misregistered adapter, unsupported chain id
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Test node unreachable or answered with something that is not a revert
    #[error("transport error: {0}")]
    Transport(String),

    #[error("call reverted: {0}")]
    Reverted(CallRevert),
}

impl HarnessError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Fatal errors truncate the run; nothing after them is meaningful.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Transport(_))
    }

    pub fn as_revert(&self) -> Option<&CallRevert> {
        match self {
            Self::Reverted(revert) => Some(revert),
            _ => None,
        }
    }
}

/// A call or transaction the chain refused to execute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRevert {
    /// Raw revert payload (selector + ABI-encoded arguments), possibly empty
    pub data: Bytes,
    /// Node-provided message, e.g. "execution reverted"
    pub message: String,
}

impl CallRevert {
    pub fn new(data: impl Into<Bytes>, message: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CallRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (data: {})", self.message, self.data)
        }
    }
}

/// A conformance property the adapter failed to honor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("quote overestimates output: quoted {quoted}, received {actual}")]
    Overquoted { quoted: U256, actual: U256 },

    #[error(
        "quote underestimates output beyond tolerance {tolerance}: quoted {quoted}, received {actual}"
    )]
    Underquoted {
        quoted: U256,
        actual: U256,
        tolerance: U256,
    },

    #[error("deposit address {deposit} holds {after} after the swap, held {before} before")]
    StrandedDeposit {
        deposit: Address,
        before: U256,
        after: U256,
    },

    #[error("balance of {account} changed by {actual}, expected {expected}")]
    BalanceDelta {
        account: Address,
        expected: String,
        actual: String,
    },

    #[error("query reverted: {0}")]
    QueryReverted(String),

    #[error("swap reverted: {0}")]
    SwapReverted(String),

    #[error("swap of {declared} succeeded with only {deposited} deposited")]
    ShortDepositAccepted { declared: U256, deposited: U256 },

    #[error("{operation} called by non-owner {caller} succeeded")]
    UnauthorizedCallSucceeded {
        operation: &'static str,
        caller: Address,
    },

    #[error("{operation} called by {caller} was rejected for a non-authorization reason: {reason}")]
    UnexpectedRejection {
        operation: &'static str,
        caller: Address,
        reason: String,
    },

    #[error("{operation} called by {caller} failed: {reason}")]
    AuthorizedCallFailed {
        operation: &'static str,
        caller: Address,
        reason: String,
    },
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
