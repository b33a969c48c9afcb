//! Test node control for adapter conformance runs
//!
//! Anvil cheat-code calls (fork reset, raw storage writes, snapshots) go over
//! plain JSON-RPC with `reqwest`; regular transactions use the alloy provider.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use swap_adapter_rs::{HarnessError, HarnessResult, TestNode};
use tracing::{debug, info};

/// Anvil state-manipulation client
pub struct AnvilClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl AnvilClient {
    /// Create a new AnvilClient
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Send one JSON-RPC request and return its `result`.
    ///
    /// Connection and HTTP failures are transport errors. An `error` object in
    /// the response means the node refused the request, which for cheat codes
    /// is a setup problem.
    async fn request(&self, method: &str, params: Value) -> HarnessResult<Value> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request_body(method, params))
            .send()
            .await
            .map_err(|e| HarnessError::transport(format!("{} failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(HarnessError::transport(format!(
                "{} failed: {}",
                method,
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| HarnessError::transport(format!("{} returned invalid JSON: {}", method, e)))?;

        rpc_result(method, body)
    }

    /// Current block number
    pub async fn block_number(&self) -> HarnessResult<u64> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| HarnessError::transport("eth_blockNumber returned no number"))?;

        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| HarnessError::transport(format!("bad block number {:?}: {}", hex, e)))
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> HarnessResult<u64> {
        let result = self.request("eth_chainId", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| HarnessError::transport("eth_chainId returned no number"))?;

        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| HarnessError::transport(format!("bad chain id {:?}: {}", hex, e)))
    }

    /// True if the node answers `eth_blockNumber`
    pub async fn is_healthy(&self) -> bool {
        self.block_number().await.is_ok()
    }
}

#[async_trait]
impl TestNode for AnvilClient {
    async fn fork_at(&self, fork_url: &str, block_number: u64) -> HarnessResult<()> {
        info!(block_number, "Resetting fork");
        self.request("anvil_reset", fork_params(fork_url, block_number))
            .await?;
        Ok(())
    }

    async fn set_storage_at(
        &self,
        contract: Address,
        slot: B256,
        value: B256,
    ) -> HarnessResult<()> {
        debug!(contract = %contract, slot = %slot, "anvil_setStorageAt");
        let result = self
            .request("anvil_setStorageAt", json!([contract, slot, value]))
            .await?;

        if result == Value::Bool(false) {
            return Err(HarnessError::configuration(format!(
                "node refused storage write to {} at {}",
                contract, slot
            )));
        }
        Ok(())
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> HarnessResult<B256> {
        let result = self
            .request("eth_getStorageAt", json!([contract, slot, "latest"]))
            .await?;

        serde_json::from_value(result)
            .map_err(|e| HarnessError::transport(format!("bad storage word: {}", e)))
    }

    async fn snapshot(&self) -> HarnessResult<U256> {
        let result = self.request("evm_snapshot", json!([])).await?;
        let id: U256 = serde_json::from_value(result)
            .map_err(|e| HarnessError::transport(format!("bad snapshot id: {}", e)))?;

        debug!(snapshot = %id, "Took snapshot");
        Ok(id)
    }

    async fn revert_to(&self, snapshot_id: U256) -> HarnessResult<()> {
        let result = self.request("evm_revert", json!([snapshot_id])).await?;
        if result != Value::Bool(true) {
            return Err(HarnessError::transport(format!(
                "evm_revert to snapshot {} failed",
                snapshot_id
            )));
        }

        debug!(snapshot = %snapshot_id, "Reverted to snapshot");
        Ok(())
    }
}

fn request_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    })
}

/// Extract `result` from a JSON-RPC response body; an `error` object means
/// the node refused the request
fn rpc_result(method: &str, body: Value) -> HarnessResult<Value> {
    if let Some(error) = body.get("error") {
        return Err(HarnessError::configuration(format!(
            "node rejected {}: {}",
            method, error
        )));
    }

    Ok(body.get("result").cloned().unwrap_or(Value::Null))
}

fn fork_params(fork_url: &str, block_number: u64) -> Value {
    json!([{
        "forking": {
            "jsonRpcUrl": fork_url,
            "blockNumber": block_number
        }
    }])
}
