//! Common types for adapter conformance runs

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Tokens
// ============================================================================

/// A pool token as the harness sees it for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    /// Storage slot where the token's balance mapping is rooted
    pub balance_slot: u64,
}

impl PoolToken {
    /// Scale a whole-token amount into raw units
    pub fn units(&self, whole: u128) -> U256 {
        to_token_units(whole, self.decimals)
    }
}

impl fmt::Display for PoolToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Convert a whole-token amount to raw token units (`amount * 10^decimals`)
pub fn to_token_units(amount: u128, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

// ============================================================================
// Underquoting tolerance
// ============================================================================

/// How far an adapter's quote may fall short of what the swap delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnderquotingTolerance(pub U256);

impl UnderquotingTolerance {
    pub fn new(tolerance: u64) -> Self {
        Self(U256::from(tolerance))
    }

    pub fn value(&self) -> U256 {
        self.0
    }
}

impl Default for UnderquotingTolerance {
    /// The canonical configuration: quotes may underquote by 1 wei at most
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Display for UnderquotingTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// One swap to drive through the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Index of the input token in the fixture's token list
    pub token_from: usize,
    /// Index of the output token in the fixture's token list
    pub token_to: usize,
    /// Whole-token amount as configured
    pub whole_amount: u128,
    /// Raw amount in `token_from` units
    pub amount: U256,
    /// 1-based position in the sweep
    pub sequence: u64,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{} -> {}] amount={} ({} raw)",
            self.sequence, self.token_from, self.token_to, self.whole_amount, self.amount
        )
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// A confirmed, successful transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOutcome {
    pub tx_hash: B256,
    /// Native currency paid for gas (`gas_used * effective_gas_price`)
    pub fee: U256,
}
