//! Storage slot derivation for ERC20 balance mappings
//!
//! Solidity stores `mapping(address => uint256) balances` declared at slot `p`
//! so that the value for key `k` lives at:
//!
//! ```solidity
//! keccak256(abi.encode(k, p))
//! ```
//!
//! Both the key and the base slot are left-padded to 32 bytes before hashing.
//! The base slot is a property of each token's layout (DAI uses 2, USDC 9,
//! USDT 2 on mainnet) and must be configured per token.

use alloy::primitives::{Address, B256, U256};
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Convert an EVM address to bytes32 (left-padded with zeros)
pub fn address_to_bytes32(addr: &Address) -> [u8; 32] {
    let mut result = [0u8; 32];
    result[12..32].copy_from_slice(addr.as_slice());
    result
}

/// Compute the storage slot holding `account`'s entry in a mapping rooted at
/// `base_slot`.
pub fn compute_balance_slot(account: Address, base_slot: u64) -> B256 {
    // abi.encode layout: 32 (key) + 32 (slot) = 64 bytes
    let mut data = [0u8; 64];
    data[0..32].copy_from_slice(&address_to_bytes32(&account));
    data[32..64].copy_from_slice(&U256::from(base_slot).to_be_bytes::<32>());

    B256::from(keccak256(&data))
}

/// Encode an amount as the raw 32-byte storage word (`abi.encode(uint256)`)
pub fn encode_uint256(amount: U256) -> B256 {
    B256::from(amount.to_be_bytes::<32>())
}

/// Decode a raw 32-byte storage word back into an amount
pub fn decode_uint256(word: B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// A single raw storage write against the test node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageOverride {
    pub contract: Address,
    pub slot: B256,
    pub value: B256,
}

impl StorageOverride {
    /// Build the override that sets `account`'s balance in `token` to `amount`
    pub fn balance(token: Address, account: Address, amount: U256, base_slot: u64) -> Self {
        Self {
            contract: token,
            slot: compute_balance_slot(account, base_slot),
            value: encode_uint256(amount),
        }
    }
}
