//! EVM RPC client wrapper
//!
//! Builds a single provider that can sign for every harness actor (owner,
//! third party). The actor is picked per transaction through its `from`
//! address; the wallet filler then signs with the matching key.

use crate::error::{CallRevert, HarnessError};
use crate::types::TxOutcome;
use alloy::{
    network::EthereumWallet,
    primitives::{Bytes, B256, U256},
    providers::{Provider, ProviderBuilder},
    rpc::{json_rpc::ErrorPayload, types::TransactionReceipt},
    signers::local::PrivateKeySigner,
    transports::{RpcError, TransportErrorKind},
};
use eyre::{eyre, Result};
use tracing::info;

/// Build a local signer from a raw private key
pub fn signer_from_key(private_key: &B256) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_bytes(private_key).map_err(|e| eyre!("Invalid private key: {}", e))
}

/// Connect to `rpc_url` with a wallet holding every signer in `signers`.
///
/// The first signer is the wallet default.
pub async fn connect_with_signers(
    rpc_url: &str,
    signers: Vec<PrivateKeySigner>,
) -> Result<impl Provider + Clone + 'static> {
    let mut iter = signers.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| eyre!("At least one signer is required"))?;

    let mut addresses = vec![first.address()];
    let mut wallet = EthereumWallet::from(first);
    for signer in iter {
        addresses.push(signer.address());
        wallet.register_signer(signer);
    }

    // Use with_recommended_fillers() to automatically fill nonce, gas, and fees
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_builtin(rpc_url)
        .await
        .map_err(|e| eyre!("Failed to connect to {}: {}", rpc_url, e))?;

    info!(rpc_url = %rpc_url, signers = ?addresses, "Created EVM client with signers");

    Ok(provider)
}

/// Convert a confirmed receipt into a [`TxOutcome`], treating a failed
/// status as a revert.
pub fn receipt_outcome(receipt: &TransactionReceipt, what: &str) -> Result<TxOutcome, HarnessError> {
    if !receipt.status() {
        return Err(HarnessError::Reverted(CallRevert::new(
            Bytes::new(),
            format!("{} transaction reverted", what),
        )));
    }

    Ok(TxOutcome {
        tx_hash: receipt.transaction_hash,
        fee: U256::from(receipt.gas_used) * U256::from(receipt.effective_gas_price),
    })
}

/// JSON-RPC error code nodes use for `execution reverted`
const EXECUTION_REVERTED: i64 = 3;

/// Map an RPC failure to the harness taxonomy.
///
/// Execution reverts (including gas-estimation failures, which is where
/// reverts surface when fillers are used) become [`HarnessError::Reverted`].
/// Any other node error, such as a stale nonce or missing gas funds, is
/// transport.
pub fn map_rpc_error(err: RpcError<TransportErrorKind>, what: &str) -> HarnessError {
    match err.as_error_resp() {
        Some(payload) if is_execution_revert(payload) => HarnessError::Reverted(CallRevert::new(
            payload.as_revert_data().unwrap_or_default(),
            format!("{}: {}", what, payload.message),
        )),
        Some(payload) => HarnessError::transport(format!(
            "{}: node error {}: {}",
            what, payload.code, payload.message
        )),
        None => HarnessError::transport(format!("{}: {}", what, err)),
    }
}

fn is_execution_revert(payload: &ErrorPayload) -> bool {
    payload.code == EXECUTION_REVERTED
        || payload.as_revert_data().is_some()
        || payload.message.starts_with("execution reverted")
}

/// Map a contract-binding failure to the harness taxonomy
pub fn map_contract_error(err: alloy::contract::Error, what: &str) -> HarnessError {
    match err {
        alloy::contract::Error::TransportError(inner) => map_rpc_error(inner, what),
        other => HarnessError::transport(format!("{}: {}", what, other)),
    }
}

/// Map a pending-transaction failure (receipt polling) to transport
pub fn map_pending_error(err: impl std::fmt::Display, what: &str) -> HarnessError {
    HarnessError::transport(format!("{}: failed to get receipt: {}", what, err))
}
