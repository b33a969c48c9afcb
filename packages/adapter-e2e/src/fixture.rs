//! Test fixture: everything a conformance run needs, built once
//!
//! Bootstrapping resets the fork, resolves the configured tokens, funds the
//! owner through storage writes and attaches to (or deploys) the adapter.
//! The fixture is then borrowed by the runner and the test catalogue.

use crate::balance_setter::StorageSlotBalanceSetter;
use crate::config::{HarnessConfig, TokenTable};
use crate::deploy::{deploy_adapter, AdapterDeployment};
use crate::evm::AnvilClient;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use eyre::{eyre, Result};
use std::sync::Arc;
use swap_adapter_rs::evm::{connect_with_signers, signer_from_key, EvmAdapter, EvmLedger};
use swap_adapter_rs::{
    AccessControl, HarnessError, HarnessResult, Ledger, Ownable, PoolToken, SwapAdapter, TestNode,
    UnderquotingTolerance,
};
use tracing::{info, warn};

/// Whole tokens injected into the owner's balance per token
pub const OWNER_FUNDING: u128 = 1_000_000_000_000;

/// Immutable inputs of a conformance run
pub struct TestFixture {
    pub adapter: Arc<dyn SwapAdapter>,
    pub ledger: Arc<dyn Ledger>,
    pub node: Arc<dyn TestNode>,
    pub access: Arc<dyn AccessControl>,
    /// Pool tokens in the adapter's index order
    pub tokens: Vec<PoolToken>,
    /// Adapter owner; funds deposits and receives swap output
    pub owner: Address,
    /// Unprivileged third party
    pub dude: Address,
    /// Pool the adapter is expected to wrap
    pub expected_pool: Address,
    pub tolerance: UnderquotingTolerance,
    pub check_underquoting: bool,
}

impl TestFixture {
    /// Build the fixture against a live test node
    pub async fn bootstrap(config: &HarnessConfig) -> Result<Self> {
        let owner_signer = signer_from_key(&config.accounts.owner_key)?;
        let dude_signer = signer_from_key(&config.accounts.dude_key)?;
        let owner = owner_signer.address();
        let dude = dude_signer.address();

        let node = Arc::new(AnvilClient::new(config.evm.rpc_url.as_str()));
        match &config.fork.url {
            Some(url) => node.fork_at(url.as_str(), config.fork.block_number).await?,
            None => warn!("No fork URL configured, testing against the node's current state"),
        }

        let node_chain_id = node.chain_id().await?;
        if node_chain_id != config.evm.chain_id {
            warn!(
                node = node_chain_id,
                configured = config.evm.chain_id,
                "Node chain id differs from the configured one"
            );
        }

        let provider =
            connect_with_signers(config.evm.rpc_url.as_str(), vec![owner_signer, dude_signer])
                .await?;
        let ledger = Arc::new(EvmLedger::new(provider.clone()));

        let table = config.token_table()?;
        let tokens = prepare_tokens(
            node.as_ref(),
            ledger.as_ref(),
            &table,
            config.evm.chain_id,
            &config.sweep.symbols,
            owner,
        )
        .await?;

        let expected_pool = table.base_pool(config.evm.chain_id, &config.adapter.dex)?;
        let adapter_address = match (config.adapter.address, &config.adapter.artifact) {
            (Some(address), _) => {
                info!(adapter = %address, "Attaching to deployed adapter");
                address
            }
            (None, Some(artifact)) => {
                let deployment = AdapterDeployment::from_config(&config.adapter, expected_pool);
                deploy_adapter(&provider, owner, artifact, &deployment).await?
            }
            (None, None) => {
                return Err(HarnessError::configuration(
                    "no adapter: set ADAPTER_ADDRESS or ADAPTER_ARTIFACT",
                )
                .into())
            }
        };

        let code = provider
            .get_code_at(adapter_address)
            .await
            .map_err(|e| eyre!("Failed to read adapter code: {}", e))?;
        if code.is_empty() {
            return Err(HarnessError::configuration(format!(
                "no contract deployed at adapter address {}",
                adapter_address
            ))
            .into());
        }

        Ok(Self {
            adapter: Arc::new(EvmAdapter::new(provider, adapter_address)),
            ledger,
            node,
            access: Arc::new(Ownable),
            tokens,
            owner,
            dude,
            expected_pool,
            tolerance: config.sweep.tolerance,
            check_underquoting: config.sweep.check_underquoting,
        })
    }

    /// Token at `index`, or a configuration error
    pub fn token(&self, index: usize) -> HarnessResult<&PoolToken> {
        self.tokens.get(index).ok_or_else(|| {
            HarnessError::configuration(format!(
                "token index {} out of range ({} tokens configured)",
                index,
                self.tokens.len()
            ))
        })
    }

    /// Where swap output goes during the sweep
    pub fn recipient(&self) -> Address {
        self.owner
    }
}

/// Resolve each symbol, read its decimals and fund `owner` with
/// [`OWNER_FUNDING`] whole tokens, verifying the balance reads back exactly.
pub async fn prepare_tokens(
    node: &dyn TestNode,
    ledger: &dyn Ledger,
    table: &TokenTable,
    chain_id: u64,
    symbols: &[String],
    owner: Address,
) -> HarnessResult<Vec<PoolToken>> {
    if symbols.len() < 2 {
        return Err(HarnessError::configuration(
            "at least two token symbols are required",
        ));
    }

    let setter = StorageSlotBalanceSetter::new(node, ledger);
    let mut tokens = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let entry = table.token(chain_id, symbol)?;
        let decimals = ledger
            .token_decimals(entry.address)
            .await
            .map_err(|e| match e {
                HarnessError::Reverted(revert) => HarnessError::configuration(format!(
                    "{} at {} does not answer decimals(): {}",
                    symbol, entry.address, revert
                )),
                other => other,
            })?;

        let token = PoolToken {
            symbol: symbol.clone(),
            address: entry.address,
            decimals,
            balance_slot: entry.balance_slot,
        };

        let amount = token.units(OWNER_FUNDING);
        setter.fund(&token, owner, amount).await?;
        info!(token = %token, decimals, amount = %amount, "Funded owner");

        tokens.push(token);
    }

    Ok(tokens)
}

/// Chain snapshot that every test starts from.
///
/// Reverting consumes a snapshot on anvil, so a fresh one is taken after
/// each restore.
pub struct Checkpoint {
    node: Arc<dyn TestNode>,
    id: U256,
}

impl Checkpoint {
    pub async fn take(node: Arc<dyn TestNode>) -> HarnessResult<Self> {
        let id = node.snapshot().await?;
        Ok(Self { node, id })
    }

    pub async fn restore(&mut self) -> HarnessResult<()> {
        self.node.revert_to(self.id).await?;
        self.id = self.node.snapshot().await?;
        Ok(())
    }
}
