//! Chain seams consumed by the conformance harness
//!
//! - [`SwapAdapter`] - the adapter contract under test (black box)
//! - [`Ledger`] - token and native balances plus real transfers
//! - [`TestNode`] - programmable node operations (fork, storage override, snapshots)
//!
//! Mutating operations resolve only once the transaction is confirmed. A
//! rejected call surfaces as [`HarnessError::Reverted`]; anything else the
//! node reports is a transport error.
//!
//! [`HarnessError::Reverted`]: crate::error::HarnessError::Reverted

use crate::error::HarnessResult;
use crate::types::TxOutcome;
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

/// The uniform adapter interface
#[async_trait]
pub trait SwapAdapter: Send + Sync {
    /// Address of the deployed adapter
    fn address(&self) -> Address;

    /// Underlying pool the adapter routes through
    async fn pool(&self) -> HarnessResult<Address>;

    async fn is_pool_token(&self, token: Address) -> HarnessResult<bool>;

    async fn token_index(&self, token: Address) -> HarnessResult<u64>;

    /// Where input funds must be sent before calling `swap`
    async fn deposit_address(&self, token_in: Address, token_out: Address)
        -> HarnessResult<Address>;

    /// Expected output for `amount_in`; must not mutate state
    async fn query(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> HarnessResult<U256>;

    async fn swap(
        &self,
        caller: Address,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        to: Address,
    ) -> HarnessResult<TxOutcome>;

    /// Owner-only rescue of ERC20 balance held by the adapter
    async fn recover_erc20(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome>;

    /// Owner-only rescue of native currency held by the adapter
    async fn recover_gas(&self, caller: Address, amount: U256) -> HarnessResult<TxOutcome>;
}

/// Balances and real transfers
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn token_balance(&self, token: Address, account: Address) -> HarnessResult<U256>;

    async fn token_decimals(&self, token: Address) -> HarnessResult<u8>;

    async fn transfer(
        &self,
        from: Address,
        token: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome>;

    async fn native_balance(&self, account: Address) -> HarnessResult<U256>;

    async fn send_native(&self, from: Address, to: Address, amount: U256)
        -> HarnessResult<TxOutcome>;
}

/// Programmable test node (anvil / hardhat)
#[async_trait]
pub trait TestNode: Send + Sync {
    /// Reset the node to a fork of `fork_url` at `block_number`
    async fn fork_at(&self, fork_url: &str, block_number: u64) -> HarnessResult<()>;

    /// Overwrite a single storage word
    async fn set_storage_at(&self, contract: Address, slot: B256, value: B256)
        -> HarnessResult<()>;

    /// Read a single storage word
    async fn storage_at(&self, contract: Address, slot: B256) -> HarnessResult<B256>;

    /// Capture the current chain state
    async fn snapshot(&self) -> HarnessResult<U256>;

    /// Restore a state captured by [`TestNode::snapshot`]
    async fn revert_to(&self, snapshot_id: U256) -> HarnessResult<()>;
}
