//! Swap-Adapter-RS: Shared Library for Swap Adapter Conformance Testing
//!
//! This crate provides the pieces the conformance harness is built from:
//!
//! - **Storage** - Balance-mapping slot derivation and raw storage words
//! - **Types** - Pool tokens, scenarios, underquoting tolerance, tx outcomes
//! - **Errors** - Configuration / invariant / transport / revert taxonomy
//! - **Access** - Authorization classification for owner-gated calls
//! - **Chain** - Seams for the adapter, the ledger and the test node
//! - **EVM Module** - Alloy-backed adapter and ledger clients
//! - **Testing Module** - Assertions and an in-memory venue for unit tests
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! swap-adapter-rs = { path = "../swap-adapter-rs" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Alloy-backed chain clients (default)
//! - `testing` - Assertions and the in-memory venue
//! - `full` - Enable all features

// Core modules (always available)
pub mod access;
pub mod chain;
pub mod error;
pub mod storage;
pub mod types;

#[cfg(feature = "evm")]
pub mod evm;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used items at the crate root
pub use access::{AccessControl, Ownable};
pub use chain::{Ledger, SwapAdapter, TestNode};
pub use error::{CallRevert, HarnessError, HarnessResult, InvariantViolation};
pub use storage::{compute_balance_slot, encode_uint256, StorageOverride};
pub use types::{to_token_units, PoolToken, Scenario, TxOutcome, UnderquotingTolerance};
