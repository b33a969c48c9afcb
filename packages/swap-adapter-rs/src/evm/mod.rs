//! EVM Chain Support Module
//!
//! Alloy-backed implementations of the chain seams.
//!
//! ## Submodules
//!
//! - `client` - provider construction and RPC error mapping
//! - `contracts` - adapter and ERC20 bindings using alloy sol! macro
//! - `adapter` - [`EvmAdapter`], the adapter contract client
//! - `ledger` - [`EvmLedger`], ERC20/native balances and transfers

pub mod adapter;
pub mod client;
pub mod contracts;
pub mod ledger;

// Re-export commonly used items
pub use adapter::EvmAdapter;
pub use client::{connect_with_signers, signer_from_key};
pub use contracts::{IAdapter, IERC20};
pub use ledger::EvmLedger;
