//! ERC20 and native balance helpers backed by an alloy provider

use crate::chain::Ledger;
use crate::error::HarnessResult;
use crate::evm::client::{map_contract_error, map_pending_error, map_rpc_error, receipt_outcome};
use crate::evm::contracts::IERC20;
use crate::types::TxOutcome;
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use tracing::debug;

/// Balances and transfers on the forked chain
pub struct EvmLedger<P> {
    provider: P,
}

impl<P: Provider + Clone + 'static> EvmLedger<P> {
    /// Create a new EvmLedger instance
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> Ledger for EvmLedger<P> {
    async fn token_balance(&self, token: Address, account: Address) -> HarnessResult<U256> {
        let contract = IERC20::new(token, &self.provider);
        let balance = contract
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| map_contract_error(e, "balanceOf"))?;
        Ok(balance._0)
    }

    async fn token_decimals(&self, token: Address) -> HarnessResult<u8> {
        let contract = IERC20::new(token, &self.provider);
        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| map_contract_error(e, "decimals"))?;
        Ok(decimals._0)
    }

    async fn transfer(
        &self,
        from: Address,
        token: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        debug!(token = %token, from = %from, to = %to, amount = %amount, "ERC20 transfer");

        let contract = IERC20::new(token, &self.provider);
        let pending_tx = contract
            .transfer(to, amount)
            .from(from)
            .send()
            .await
            .map_err(|e| map_contract_error(e, "transfer"))?;
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, "transfer"))?;

        receipt_outcome(&receipt, "transfer")
    }

    async fn native_balance(&self, account: Address) -> HarnessResult<U256> {
        self.provider
            .get_balance(account)
            .await
            .map_err(|e| map_rpc_error(e, "eth_getBalance"))
    }

    async fn send_native(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        debug!(from = %from, to = %to, amount = %amount, "Native transfer");

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(amount);

        let pending_tx = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| map_rpc_error(e, "send_transaction"))?;
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, "send_transaction"))?;

        receipt_outcome(&receipt, "native transfer")
    }
}
