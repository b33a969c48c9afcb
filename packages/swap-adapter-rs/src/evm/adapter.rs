//! Adapter contract client backed by an alloy provider

use crate::chain::SwapAdapter;
use crate::error::{HarnessError, HarnessResult};
use crate::evm::client::{map_contract_error, map_pending_error, receipt_outcome};
use crate::evm::contracts::IAdapter;
use crate::types::TxOutcome;
use alloy::{
    primitives::{Address, U256},
    providers::Provider,
};
use async_trait::async_trait;
use tracing::debug;

/// Deployed adapter reached over JSON-RPC
pub struct EvmAdapter<P> {
    provider: P,
    address: Address,
}

impl<P: Provider + Clone + 'static> EvmAdapter<P> {
    /// Create a new EvmAdapter instance
    pub fn new(provider: P, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> SwapAdapter for EvmAdapter<P> {
    fn address(&self) -> Address {
        self.address
    }

    async fn pool(&self) -> HarnessResult<Address> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let result = adapter
            .pool()
            .call()
            .await
            .map_err(|e| map_contract_error(e, "pool"))?;
        Ok(result._0)
    }

    async fn is_pool_token(&self, token: Address) -> HarnessResult<bool> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let result = adapter
            .isPoolToken(token)
            .call()
            .await
            .map_err(|e| map_contract_error(e, "isPoolToken"))?;
        Ok(result._0)
    }

    async fn token_index(&self, token: Address) -> HarnessResult<u64> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let result = adapter
            .tokenIndex(token)
            .call()
            .await
            .map_err(|e| map_contract_error(e, "tokenIndex"))?;
        result._0.try_into().map_err(|_| {
            HarnessError::configuration(format!(
                "tokenIndex({}) returned out-of-range value {}",
                token, result._0
            ))
        })
    }

    async fn deposit_address(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> HarnessResult<Address> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let result = adapter
            .depositAddress(token_in, token_out)
            .call()
            .await
            .map_err(|e| map_contract_error(e, "depositAddress"))?;
        Ok(result._0)
    }

    async fn query(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> HarnessResult<U256> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let result = adapter
            .query(amount_in, token_in, token_out)
            .call()
            .await
            .map_err(|e| map_contract_error(e, "query"))?;
        Ok(result._0)
    }

    async fn swap(
        &self,
        caller: Address,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        to: Address,
    ) -> HarnessResult<TxOutcome> {
        debug!(
            adapter = %self.address,
            caller = %caller,
            amount_in = %amount_in,
            token_in = %token_in,
            token_out = %token_out,
            "Submitting swap"
        );

        let adapter = IAdapter::new(self.address, &self.provider);
        let pending_tx = adapter
            .swap(amount_in, token_in, token_out, to)
            .from(caller)
            .send()
            .await
            .map_err(|e| map_contract_error(e, "swap"))?;
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, "swap"))?;

        receipt_outcome(&receipt, "swap")
    }

    async fn recover_erc20(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let pending_tx = adapter
            .recoverERC20(token, amount)
            .from(caller)
            .send()
            .await
            .map_err(|e| map_contract_error(e, "recoverERC20"))?;
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, "recoverERC20"))?;

        receipt_outcome(&receipt, "recoverERC20")
    }

    async fn recover_gas(&self, caller: Address, amount: U256) -> HarnessResult<TxOutcome> {
        let adapter = IAdapter::new(self.address, &self.provider);
        let pending_tx = adapter
            .recoverGAS(amount)
            .from(caller)
            .send()
            .await
            .map_err(|e| map_contract_error(e, "recoverGAS"))?;
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, "recoverGAS"))?;

        receipt_outcome(&receipt, "recoverGAS")
    }
}
