//! Adapter deployment from a forge build artifact
//!
//! The artifact's creation bytecode is concatenated with the ABI-encoded
//! constructor arguments `(name, pool, swapGasEstimate, directSwapSupported)`
//! and sent as a contract-creation transaction from the owner.

use crate::config::AdapterConfig;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ForgeArtifact {
    bytecode: ArtifactBytecode,
}

#[derive(Debug, Deserialize)]
struct ArtifactBytecode {
    object: String,
}

/// Constructor parameters of an adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDeployment {
    pub name: String,
    pub pool: Address,
    pub swap_gas: u64,
    pub direct_swap_supported: bool,
}

impl AdapterDeployment {
    pub fn from_config(config: &AdapterConfig, pool: Address) -> Self {
        Self {
            name: config.name.clone(),
            pool,
            swap_gas: config.swap_gas,
            direct_swap_supported: config.direct_swap_supported,
        }
    }

    /// ABI-encoded constructor arguments
    pub fn constructor_args(&self) -> Vec<u8> {
        (
            self.name.clone(),
            self.pool,
            U256::from(self.swap_gas),
            self.direct_swap_supported,
        )
            .abi_encode_params()
    }
}

/// Extract creation bytecode from forge artifact JSON
pub fn parse_artifact(json: &str) -> Result<Bytes> {
    let artifact: ForgeArtifact = serde_json::from_str(json).wrap_err("Malformed forge artifact")?;
    let object = artifact.bytecode.object.trim_start_matches("0x");

    if object.is_empty() {
        return Err(eyre!("Artifact has no creation bytecode (abstract contract or interface?)"));
    }
    if object.contains("__$") {
        return Err(eyre!("Artifact bytecode has unlinked library placeholders"));
    }

    let code = hex::decode(object).wrap_err("Artifact bytecode is not valid hex")?;
    Ok(Bytes::from(code))
}

/// Read creation bytecode from a forge artifact file
pub fn load_artifact(path: &Path) -> Result<Bytes> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read artifact {}", path.display()))?;
    parse_artifact(&content)
}

/// Deploy an adapter and return its address
pub async fn deploy_adapter<P: Provider>(
    provider: &P,
    deployer: Address,
    artifact: &Path,
    deployment: &AdapterDeployment,
) -> Result<Address> {
    let bytecode = load_artifact(artifact)?;
    let mut code = bytecode.to_vec();
    code.extend_from_slice(&deployment.constructor_args());

    info!(
        name = %deployment.name,
        pool = %deployment.pool,
        swap_gas = deployment.swap_gas,
        direct_swap_supported = deployment.direct_swap_supported,
        "Deploying adapter"
    );

    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(code);

    let receipt = provider
        .send_transaction(tx)
        .await
        .wrap_err("Adapter deployment was rejected")?
        .get_receipt()
        .await
        .wrap_err("Failed to get deployment receipt")?;

    if !receipt.status() {
        return Err(eyre!("Adapter constructor reverted"));
    }

    let address = receipt
        .contract_address
        .ok_or_else(|| eyre!("Deployment receipt has no contract address"))?;

    info!(adapter = %address, "Adapter deployed");
    Ok(address)
}
