//! Balance injection through raw storage writes
//!
//! ERC20 balances live in a `mapping(address => uint256)` rooted at a
//! token-specific base slot. Writing the derived slot directly gives any
//! account any balance without a holder to transfer from.

use alloy::primitives::{address, Address, U256};
use swap_adapter_rs::{
    HarnessError, HarnessResult, Ledger, PoolToken, StorageOverride, TestNode,
};
use tracing::{debug, info};

/// Account used to check balance layouts; holds nothing on mainnet
pub const LAYOUT_ACCOUNT: Address = address!("1000000000000000000000000000000000000001");

/// Distinctive value written during layout verification
const LAYOUT_SENTINEL: u64 = 0x5eed_1e55_c0ff_ee42;

/// Writes token balances straight into contract storage
pub struct StorageSlotBalanceSetter<'a> {
    node: &'a dyn TestNode,
    ledger: &'a dyn Ledger,
}

impl<'a> StorageSlotBalanceSetter<'a> {
    pub fn new(node: &'a dyn TestNode, ledger: &'a dyn Ledger) -> Self {
        Self { node, ledger }
    }

    /// Overwrite `account`'s balance of `token` with `amount`.
    ///
    /// A node that refuses the write is a configuration problem; transport
    /// failures keep their own category.
    pub async fn set_balance(
        &self,
        token: Address,
        account: Address,
        amount: U256,
        base_slot: u64,
    ) -> HarnessResult<StorageOverride> {
        let op = StorageOverride::balance(token, account, amount, base_slot);
        debug!(
            token = %token,
            account = %account,
            amount = %amount,
            base_slot,
            slot = %op.slot,
            "Injecting balance"
        );

        self.node
            .set_storage_at(op.contract, op.slot, op.value)
            .await
            .map_err(|e| match e {
                HarnessError::Transport(_) => e,
                other => HarnessError::configuration(format!(
                    "storage override for {} at slot {} rejected: {}",
                    token, op.slot, other
                )),
            })?;

        Ok(op)
    }

    /// Check that `token.balance_slot` really roots the balance mapping by
    /// writing a sentinel for `account` and reading it back through `balanceOf`.
    pub async fn verify_layout(&self, token: &PoolToken, account: Address) -> HarnessResult<()> {
        let sentinel = U256::from(LAYOUT_SENTINEL);
        let op = self
            .set_balance(token.address, account, sentinel, token.balance_slot)
            .await?;

        let stored = self.node.storage_at(op.contract, op.slot).await?;
        if stored != op.value {
            return Err(HarnessError::configuration(format!(
                "node did not apply storage override for {}: slot {} holds {}, wrote {}",
                token, op.slot, stored, op.value
            )));
        }

        let observed = self.ledger.token_balance(token.address, account).await?;
        if observed != sentinel {
            return Err(HarnessError::configuration(format!(
                "balance slot {} for {} is wrong: wrote {} to {}, balanceOf returned {}",
                token.balance_slot, token, stored, op.slot, observed
            )));
        }

        info!(token = %token.symbol, base_slot = token.balance_slot, "Balance layout verified");
        Ok(())
    }

    /// Inject `amount` and confirm `balanceOf` reports exactly that
    pub async fn fund(&self, token: &PoolToken, account: Address, amount: U256) -> HarnessResult<()> {
        self.set_balance(token.address, account, amount, token.balance_slot)
            .await?;

        let observed = self.ledger.token_balance(token.address, account).await?;
        if observed != amount {
            return Err(HarnessError::configuration(format!(
                "funding {} for {} did not stick: expected {}, balanceOf returned {}",
                token, account, amount, observed
            )));
        }

        Ok(())
    }
}
