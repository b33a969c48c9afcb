//! Configuration for adapter conformance runs
//!
//! Environment variables are read once into typed structs. The token table
//! maps a chain id to token addresses, balance-mapping slots and per-dex pool
//! addresses; a built-in table covers Ethereum mainnet.

use alloy::primitives::{b256, Address, B256};
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use swap_adapter_rs::{HarnessError, HarnessResult, UnderquotingTolerance};
use url::Url;

/// Built-in token table
const DEFAULT_TOKEN_TABLE: &str = include_str!("../config/tokens.json");

/// Anvil account 0
const ANVIL_KEY_0: B256 =
    b256!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
/// Anvil account 1
const ANVIL_KEY_1: B256 =
    b256!("59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d");

pub const DEFAULT_AMOUNTS: [u128; 4] = [8, 1001, 96420, 1337000];
pub const DEFAULT_AMOUNTS_BIG: [u128; 3] = [10200300, 200300400, 100900800700];

/// Root configuration
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    pub evm: EvmConfig,
    pub fork: ForkConfig,
    pub accounts: TestAccounts,
    pub adapter: AdapterConfig,
    pub sweep: SweepConfig,
    /// Token table override; the built-in table is used when unset
    pub token_table_path: Option<PathBuf>,
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            evm: EvmConfig::from_env()?,
            fork: ForkConfig::from_env()?,
            accounts: TestAccounts::from_env()?,
            adapter: AdapterConfig::from_env()?,
            sweep: SweepConfig::from_env()?,
            token_table_path: std::env::var("TOKEN_TABLE_PATH").ok().map(PathBuf::from),
        })
    }

    /// Load the token table from `TOKEN_TABLE_PATH` or the built-in copy
    pub fn token_table(&self) -> Result<TokenTable> {
        match &self.token_table_path {
            Some(path) => TokenTable::from_file(path),
            None => TokenTable::builtin(),
        }
    }
}

/// Test node connection
#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub rpc_url: Url,
    pub chain_id: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: Url::parse("http://localhost:8545").expect("valid default URL"),
            chain_id: 1,
        }
    }
}

impl EvmConfig {
    pub fn from_env() -> Result<Self> {
        let rpc_url =
            std::env::var("EVM_RPC_URL").unwrap_or_else(|_| "http://localhost:8545".to_string());

        Ok(Self {
            rpc_url: Url::parse(&rpc_url).wrap_err("EVM_RPC_URL is not a valid URL")?,
            chain_id: env_or("CHAIN_ID", 1)?,
        })
    }
}

/// Upstream archive node the test node forks from
#[derive(Debug, Clone)]
pub struct ForkConfig {
    pub url: Option<Url>,
    pub block_number: u64,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            url: None,
            block_number: 14_000_000,
        }
    }
}

impl ForkConfig {
    /// `FORK_RPC_URL`, falling back to `ALCHEMY_API`
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("FORK_RPC_URL")
            .or_else(|_| std::env::var("ALCHEMY_API"))
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| Url::parse(&s))
            .transpose()
            .wrap_err("FORK_RPC_URL is not a valid URL")?;

        Ok(Self {
            url,
            block_number: env_or("FORK_BLOCK_NUMBER", 14_000_000)?,
        })
    }
}

/// Private keys of the owner and the unprivileged third party
#[derive(Debug, Clone)]
pub struct TestAccounts {
    pub owner_key: B256,
    pub dude_key: B256,
}

impl Default for TestAccounts {
    fn default() -> Self {
        Self {
            owner_key: ANVIL_KEY_0,
            dude_key: ANVIL_KEY_1,
        }
    }
}

impl TestAccounts {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            owner_key: env_or("OWNER_PRIVATE_KEY", ANVIL_KEY_0)?,
            dude_key: env_or("DUDE_PRIVATE_KEY", ANVIL_KEY_1)?,
        })
    }
}

/// Adapter under test
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Attach to an already deployed adapter
    pub address: Option<Address>,
    /// Forge artifact to deploy when no address is given
    pub artifact: Option<PathBuf>,
    pub name: String,
    /// Key of the pool entry in the token table
    pub dex: String,
    pub swap_gas: u64,
    pub direct_swap_supported: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            address: None,
            artifact: None,
            name: "CurveBaseAdapter".to_string(),
            dex: "curve".to_string(),
            swap_gas: 160_000,
            direct_swap_supported: false,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("ADAPTER_ADDRESS")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Address>())
            .transpose()
            .map_err(|e| eyre!("ADAPTER_ADDRESS is not an address: {}", e))?;

        Ok(Self {
            address,
            artifact: std::env::var("ADAPTER_ARTIFACT").ok().map(PathBuf::from),
            name: std::env::var("ADAPTER_NAME").unwrap_or_else(|_| "CurveBaseAdapter".to_string()),
            dex: std::env::var("ADAPTER_DEX").unwrap_or_else(|_| "curve".to_string()),
            swap_gas: env_or("ADAPTER_SWAP_GAS", 160_000)?,
            direct_swap_supported: env_flag("DIRECT_SWAP_SUPPORTED", false),
        })
    }
}

/// Scenario sweep parameters
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub symbols: Vec<String>,
    /// Whole-token amounts for the small-medium sweep
    pub amounts: Vec<u128>,
    /// Whole-token amounts for the big sweep
    pub amounts_big: Vec<u128>,
    pub repetitions: u32,
    pub tolerance: UnderquotingTolerance,
    pub check_underquoting: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["DAI".into(), "USDC".into(), "USDT".into()],
            amounts: DEFAULT_AMOUNTS.to_vec(),
            amounts_big: DEFAULT_AMOUNTS_BIG.to_vec(),
            repetitions: 5,
            tolerance: UnderquotingTolerance::default(),
            check_underquoting: true,
        }
    }
}

impl SweepConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let symbols = match std::env::var("TOKEN_SYMBOLS") {
            Ok(raw) => parse_list::<String>(&raw).wrap_err("TOKEN_SYMBOLS")?,
            Err(_) => defaults.symbols,
        };
        let amounts = match std::env::var("SWAP_AMOUNTS") {
            Ok(raw) => parse_list(&raw).wrap_err("SWAP_AMOUNTS")?,
            Err(_) => defaults.amounts,
        };
        let amounts_big = match std::env::var("SWAP_AMOUNTS_BIG") {
            Ok(raw) => parse_list(&raw).wrap_err("SWAP_AMOUNTS_BIG")?,
            Err(_) => defaults.amounts_big,
        };

        Ok(Self {
            symbols,
            amounts,
            amounts_big,
            repetitions: env_or("SWAP_REPETITIONS", 5)?,
            tolerance: UnderquotingTolerance::new(env_or("UNDERQUOTING_TOLERANCE", 1u64)?),
            check_underquoting: env_flag("CHECK_UNDERQUOTING", true),
        })
    }
}

// ============================================================================
// Token table
// ============================================================================

/// Entry for one dex inside a chain section
#[derive(Debug, Clone, Deserialize)]
pub struct DexEntry {
    pub basepool: Address,
}

/// One chain section of the token table
#[derive(Debug, Clone, Deserialize)]
pub struct ChainEntry {
    pub assets: HashMap<String, Address>,
    pub slot: HashMap<String, u64>,
    #[serde(flatten)]
    pub dexes: HashMap<String, DexEntry>,
}

/// Token address and balance slot resolved from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEntry {
    pub address: Address,
    pub balance_slot: u64,
}

/// Static table keyed by chain id and token symbol
#[derive(Debug, Clone)]
pub struct TokenTable {
    chains: HashMap<u64, ChainEntry>,
}

impl TokenTable {
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_TOKEN_TABLE)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read token table {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(json: &str) -> Result<Self> {
        let raw: HashMap<String, ChainEntry> =
            serde_json::from_str(json).wrap_err("Malformed token table")?;

        let mut chains = HashMap::with_capacity(raw.len());
        for (key, entry) in raw {
            let chain_id = key
                .parse::<u64>()
                .map_err(|_| eyre!("Token table key {:?} is not a chain id", key))?;
            chains.insert(chain_id, entry);
        }

        Ok(Self { chains })
    }

    fn chain(&self, chain_id: u64) -> HarnessResult<&ChainEntry> {
        self.chains.get(&chain_id).ok_or_else(|| {
            HarnessError::configuration(format!("unsupported chain id {}", chain_id))
        })
    }

    /// Resolve a token symbol on a chain
    pub fn token(&self, chain_id: u64, symbol: &str) -> HarnessResult<TokenEntry> {
        let chain = self.chain(chain_id)?;
        let address = chain.assets.get(symbol).ok_or_else(|| {
            HarnessError::configuration(format!(
                "unknown token symbol {} on chain {}",
                symbol, chain_id
            ))
        })?;
        let balance_slot = chain.slot.get(symbol).ok_or_else(|| {
            HarnessError::configuration(format!(
                "no balance slot for {} on chain {}",
                symbol, chain_id
            ))
        })?;

        Ok(TokenEntry {
            address: *address,
            balance_slot: *balance_slot,
        })
    }

    /// Base pool the adapter for `dex` wraps
    pub fn base_pool(&self, chain_id: u64, dex: &str) -> HarnessResult<Address> {
        let chain = self.chain(chain_id)?;
        chain
            .dexes
            .get(dex)
            .map(|d| d.basepool)
            .ok_or_else(|| {
                HarnessError::configuration(format!("no {} pool on chain {}", dex, chain_id))
            })
    }
}

// ============================================================================
// Env helpers
// ============================================================================

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("{} has invalid value {:?}: {}", key, raw, e)),
        _ => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

/// Parse a comma-separated list, ignoring blanks
pub fn parse_list<T>(raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| eyre!("invalid item {:?}: {}", s, e)))
        .collect()
}
