//! In-Memory Venue
//!
//! A single object that plays the adapter, the token ledger and the test node
//! so the harness can be exercised without a chain. Token balances live only
//! in a storage map keyed by `(token, slot)`, derived with the same
//! keccak-based layout a Solidity token uses. A balance injected at the wrong
//! base slot therefore lands in an unrelated word and is invisible to
//! `balanceOf`, exactly like on a real fork.
//!
//! The pool prices every pair 1:1 after decimal adjustment. Quote accuracy,
//! deposit checks and access control can be degraded through
//! [`VenueBehavior`] to make the harness observe violations.

use crate::access::{encode_revert_reason, encode_unauthorized_account, OWNABLE_V4_REASON};
use crate::chain::{Ledger, SwapAdapter, TestNode};
use crate::error::{CallRevert, HarnessError, HarnessResult};
use crate::storage::{compute_balance_slot, decode_uint256, encode_uint256};
use crate::types::{to_token_units, PoolToken, TxOutcome};
use alloy::primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Anvil account 0, the adapter owner
pub const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// Anvil account 1, an unprivileged third party
pub const DUDE: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// Native fee charged for every successful transaction (21000 gas at 1 gwei)
pub const MOCK_TX_FEE: u64 = 21_000_000_000_000;

/// Whole-token reserve each pool token starts with
const POOL_RESERVE: u128 = 1_000_000_000_000_000;

/// How the owner check reports a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenialStyle {
    /// `Error("Ownable: caller is not the owner")`
    #[default]
    ReasonString,
    /// `OwnableUnauthorizedAccount(caller)`
    CustomError,
    /// Bare revert without payload
    Bare,
}

/// How the node answers storage overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageWrites {
    #[default]
    Accept,
    /// The node answers with a JSON-RPC error
    Reject,
    /// The node cannot be reached
    Unreachable,
}

/// Knobs for making the venue misbehave
#[derive(Debug, Clone, Default)]
pub struct VenueBehavior {
    /// Quote this many raw units below the real output
    pub underquote_by: U256,
    /// Quote this many raw units above the real output
    pub overquote_by: U256,
    /// Let `swap` run even when less than `amount_in` was deposited
    pub accept_short_deposits: bool,
    /// Drop the owner check on recovery functions
    pub open_recovery: bool,
    pub denial_style: DenialStyle,
    /// Report a wrong `tokenIndex` for every token after this many swaps
    pub reindex_after_swaps: Option<u64>,
    /// Swap pulls `amount_in` from the owner instead of the deposit, so
    /// deposits are left behind
    pub ignore_deposits: bool,
    pub storage_writes: StorageWrites,
}

impl VenueBehavior {
    /// Honest venue that underquotes by exactly one raw unit
    pub fn curve_like() -> Self {
        Self {
            underquote_by: U256::from(1u64),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Ledgers {
    storage: HashMap<(Address, B256), B256>,
    native: HashMap<Address, U256>,
    swaps: u64,
    nonce: u64,
}

#[derive(Debug)]
struct VenueState {
    ledgers: Ledgers,
    snapshots: Vec<Ledgers>,
    behavior: VenueBehavior,
    fork: Option<(String, u64)>,
}

/// In-memory adapter + ledger + test node
pub struct MockVenue {
    adapter: Address,
    pool: Address,
    owner: Address,
    tokens: Vec<PoolToken>,
    state: Mutex<VenueState>,
}

/// Builder for [`MockVenue`]
#[derive(Default)]
pub struct MockVenueBuilder {
    tokens: Vec<PoolToken>,
    behavior: VenueBehavior,
}

impl MockVenueBuilder {
    /// Add a pool token; its address is derived from its position
    pub fn token(mut self, symbol: &str, decimals: u8, balance_slot: u64) -> Self {
        let index = self.tokens.len() as u8;
        self.tokens.push(PoolToken {
            symbol: symbol.to_string(),
            address: Address::with_last_byte(0x10 + index),
            decimals,
            balance_slot,
        });
        self
    }

    pub fn behavior(mut self, behavior: VenueBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn build(self) -> MockVenue {
        let adapter = Address::with_last_byte(0xAD);
        let pool = Address::with_last_byte(0xB0);

        let mut ledgers = Ledgers::default();
        let ether = to_token_units(10_000, 18);
        ledgers.native.insert(OWNER, ether);
        ledgers.native.insert(DUDE, ether);

        for token in &self.tokens {
            let slot = compute_balance_slot(pool, token.balance_slot);
            ledgers.storage.insert(
                (token.address, slot),
                encode_uint256(token.units(POOL_RESERVE)),
            );
        }

        MockVenue {
            adapter,
            pool,
            owner: OWNER,
            tokens: self.tokens,
            state: Mutex::new(VenueState {
                ledgers,
                snapshots: Vec::new(),
                behavior: self.behavior,
                fork: None,
            }),
        }
    }
}

impl MockVenue {
    pub fn builder() -> MockVenueBuilder {
        MockVenueBuilder::default()
    }

    /// DAI / USDC / USDT with their mainnet balance slots, quoting one raw
    /// unit low like a Curve base pool
    pub fn stable_pool() -> Self {
        Self::builder()
            .token("DAI", 18, 2)
            .token("USDC", 6, 9)
            .token("USDT", 6, 2)
            .behavior(VenueBehavior::curve_like())
            .build()
    }

    pub fn pool_address(&self) -> Address {
        self.pool
    }

    pub fn tokens(&self) -> &[PoolToken] {
        &self.tokens
    }

    pub fn set_behavior(&self, behavior: VenueBehavior) {
        self.lock().behavior = behavior;
    }

    /// Number of swaps executed since the last revert
    pub fn swap_count(&self) -> u64 {
        self.lock().ledgers.swaps
    }

    fn lock(&self) -> MutexGuard<'_, VenueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn token(&self, address: Address) -> HarnessResult<&PoolToken> {
        self.tokens
            .iter()
            .find(|t| t.address == address)
            .ok_or_else(|| revert("Adapter: unknown token"))
    }

    fn position(&self, address: Address) -> Option<usize> {
        self.tokens.iter().position(|t| t.address == address)
    }

    /// 1:1 price after decimal adjustment
    fn output_for(&self, amount_in: U256, token_in: Address, token_out: Address) -> HarnessResult<U256> {
        let dec_in = self.token(token_in)?.decimals;
        let dec_out = self.token(token_out)?.decimals;
        Ok(amount_in * U256::from(10u64).pow(U256::from(dec_out))
            / U256::from(10u64).pow(U256::from(dec_in)))
    }

    fn denial(&self, state: &VenueState, caller: Address) -> HarnessError {
        let data = match state.behavior.denial_style {
            DenialStyle::ReasonString => encode_revert_reason(OWNABLE_V4_REASON),
            DenialStyle::CustomError => encode_unauthorized_account(caller),
            DenialStyle::Bare => Vec::new(),
        };
        HarnessError::Reverted(CallRevert::new(Bytes::from(data), "execution reverted"))
    }
}

fn revert(reason: &str) -> HarnessError {
    HarnessError::Reverted(CallRevert::new(
        Bytes::from(encode_revert_reason(reason)),
        "execution reverted",
    ))
}

impl Ledgers {
    fn balance(&self, token: &PoolToken, account: Address) -> U256 {
        let slot = compute_balance_slot(account, token.balance_slot);
        self.storage
            .get(&(token.address, slot))
            .map(|word| decode_uint256(*word))
            .unwrap_or(U256::ZERO)
    }

    fn set_balance(&mut self, token: &PoolToken, account: Address, amount: U256) {
        let slot = compute_balance_slot(account, token.balance_slot);
        self.storage
            .insert((token.address, slot), encode_uint256(amount));
    }

    fn move_tokens(
        &mut self,
        token: &PoolToken,
        from: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<()> {
        let from_balance = self.balance(token, from);
        if from_balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.set_balance(token, from, from_balance - amount);
        let to_balance = self.balance(token, to);
        self.set_balance(token, to, to_balance + amount);
        Ok(())
    }

    fn native(&self, account: Address) -> U256 {
        self.native.get(&account).copied().unwrap_or(U256::ZERO)
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> HarnessResult<()> {
        let from_balance = self.native(from);
        if from_balance < amount {
            return Err(revert("insufficient native balance"));
        }
        self.native.insert(from, from_balance - amount);
        let to_balance = self.native(to);
        self.native.insert(to, to_balance + amount);
        Ok(())
    }

    /// Charge the sender's gas and produce a receipt-like outcome
    fn confirm(&mut self, sender: Address) -> TxOutcome {
        let fee = U256::from(MOCK_TX_FEE);
        let balance = self.native(sender);
        self.native.insert(sender, balance.saturating_sub(fee));
        self.nonce += 1;
        TxOutcome {
            tx_hash: B256::from(U256::from(self.nonce)),
            fee,
        }
    }
}

#[async_trait]
impl SwapAdapter for MockVenue {
    fn address(&self) -> Address {
        self.adapter
    }

    async fn pool(&self) -> HarnessResult<Address> {
        Ok(self.pool)
    }

    async fn is_pool_token(&self, token: Address) -> HarnessResult<bool> {
        Ok(self.position(token).is_some())
    }

    async fn token_index(&self, token: Address) -> HarnessResult<u64> {
        let state = self.lock();
        let index = self
            .position(token)
            .ok_or_else(|| revert("Adapter: unknown token"))? as u64;

        match state.behavior.reindex_after_swaps {
            Some(limit) if state.ledgers.swaps >= limit => Ok(index + 1),
            _ => Ok(index),
        }
    }

    async fn deposit_address(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> HarnessResult<Address> {
        self.token(token_in)?;
        self.token(token_out)?;
        Ok(self.adapter)
    }

    async fn query(
        &self,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> HarnessResult<U256> {
        let out = self.output_for(amount_in, token_in, token_out)?;
        let state = self.lock();
        Ok(out.saturating_sub(state.behavior.underquote_by) + state.behavior.overquote_by)
    }

    async fn swap(
        &self,
        caller: Address,
        amount_in: U256,
        token_in: Address,
        token_out: Address,
        to: Address,
    ) -> HarnessResult<TxOutcome> {
        let out = self.output_for(amount_in, token_in, token_out)?;
        let from_token = self.token(token_in)?.clone();
        let to_token = self.token(token_out)?.clone();

        let mut state = self.lock();
        let behavior = state.behavior.clone();
        let ledgers = &mut state.ledgers;

        let source = if behavior.ignore_deposits {
            self.owner
        } else {
            self.adapter
        };

        let deposited = ledgers.balance(&from_token, source);
        if deposited < amount_in && !behavior.accept_short_deposits {
            return Err(revert("Adapter: insufficient deposit"));
        }

        let pulled = deposited.min(amount_in);
        ledgers.move_tokens(&from_token, source, self.pool, pulled)?;
        ledgers.move_tokens(&to_token, self.pool, to, out)?;
        ledgers.swaps += 1;

        Ok(ledgers.confirm(caller))
    }

    async fn recover_erc20(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        let token = self.token(token)?.clone();
        let mut state = self.lock();
        if caller != self.owner && !state.behavior.open_recovery {
            return Err(self.denial(&state, caller));
        }

        let ledgers = &mut state.ledgers;
        ledgers.move_tokens(&token, self.adapter, caller, amount)?;
        Ok(ledgers.confirm(caller))
    }

    async fn recover_gas(&self, caller: Address, amount: U256) -> HarnessResult<TxOutcome> {
        let mut state = self.lock();
        if caller != self.owner && !state.behavior.open_recovery {
            return Err(self.denial(&state, caller));
        }

        let ledgers = &mut state.ledgers;
        ledgers.move_native(self.adapter, caller, amount)?;
        Ok(ledgers.confirm(caller))
    }
}

#[async_trait]
impl Ledger for MockVenue {
    async fn token_balance(&self, token: Address, account: Address) -> HarnessResult<U256> {
        let token = self.token(token)?;
        Ok(self.lock().ledgers.balance(token, account))
    }

    async fn token_decimals(&self, token: Address) -> HarnessResult<u8> {
        Ok(self.token(token)?.decimals)
    }

    async fn transfer(
        &self,
        from: Address,
        token: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        let token = self.token(token)?.clone();
        let mut state = self.lock();
        let ledgers = &mut state.ledgers;
        ledgers.move_tokens(&token, from, to, amount)?;
        Ok(ledgers.confirm(from))
    }

    async fn native_balance(&self, account: Address) -> HarnessResult<U256> {
        Ok(self.lock().ledgers.native(account))
    }

    async fn send_native(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> HarnessResult<TxOutcome> {
        let mut state = self.lock();
        let ledgers = &mut state.ledgers;
        ledgers.move_native(from, to, amount)?;
        Ok(ledgers.confirm(from))
    }
}

#[async_trait]
impl TestNode for MockVenue {
    async fn fork_at(&self, fork_url: &str, block_number: u64) -> HarnessResult<()> {
        if fork_url.is_empty() {
            return Err(HarnessError::configuration("fork URL is empty"));
        }
        self.lock().fork = Some((fork_url.to_string(), block_number));
        Ok(())
    }

    async fn set_storage_at(
        &self,
        contract: Address,
        slot: B256,
        value: B256,
    ) -> HarnessResult<()> {
        let mut state = self.lock();
        match state.behavior.storage_writes {
            StorageWrites::Accept => {
                state.ledgers.storage.insert((contract, slot), value);
                Ok(())
            }
            StorageWrites::Reject => Err(HarnessError::configuration(
                "node rejected anvil_setStorageAt: Method not found",
            )),
            StorageWrites::Unreachable => Err(HarnessError::transport(
                "anvil_setStorageAt failed: connection refused",
            )),
        }
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> HarnessResult<B256> {
        let state = self.lock();
        if state.behavior.storage_writes == StorageWrites::Unreachable {
            return Err(HarnessError::transport(
                "eth_getStorageAt failed: connection refused",
            ));
        }
        Ok(state
            .ledgers
            .storage
            .get(&(contract, slot))
            .copied()
            .unwrap_or_default())
    }

    async fn snapshot(&self) -> HarnessResult<U256> {
        let mut state = self.lock();
        let copy = state.ledgers.clone();
        state.snapshots.push(copy);
        Ok(U256::from(state.snapshots.len() - 1))
    }

    /// Reverting consumes the snapshot and every later one, as anvil does
    async fn revert_to(&self, snapshot_id: U256) -> HarnessResult<()> {
        let mut state = self.lock();
        let id: usize = snapshot_id
            .try_into()
            .map_err(|_| HarnessError::transport(format!("unknown snapshot {}", snapshot_id)))?;
        if id >= state.snapshots.len() {
            return Err(HarnessError::transport(format!(
                "unknown snapshot {}",
                snapshot_id
            )));
        }
        state.snapshots.truncate(id + 1);
        if let Some(ledgers) = state.snapshots.pop() {
            state.ledgers = ledgers;
        }
        Ok(())
    }
}
