//! Authorization classification for owner-gated adapter calls
//!
//! Adapters report "caller is not the owner" in different ways depending on
//! the access-control library they were built with. The harness never matches
//! on node error messages; it asks an [`AccessControl`] implementation whether
//! a revert payload is an authorization denial.

use crate::error::CallRevert;
use alloy::sol;
use alloy::sol_types::{Revert, SolError};

sol! {
    /// OpenZeppelin v5 `Ownable` custom error
    #[derive(Debug)]
    error OwnableUnauthorizedAccount(address account);
}

/// OpenZeppelin v4 `Ownable` revert reason
pub const OWNABLE_V4_REASON: &str = "Ownable: caller is not the owner";

/// Capability check used by the harness to recognise authorization failures
pub trait AccessControl: Send + Sync {
    /// Short label for logs and reports
    fn name(&self) -> &'static str;

    /// Whether the revert means "caller lacks the required capability"
    fn is_authorization_failure(&self, revert: &CallRevert) -> bool;
}

/// `Ownable` adapters (OpenZeppelin v4 reason string or v5 custom error)
#[derive(Debug, Clone, Copy, Default)]
pub struct Ownable;

impl AccessControl for Ownable {
    fn name(&self) -> &'static str {
        "Ownable"
    }

    fn is_authorization_failure(&self, revert: &CallRevert) -> bool {
        let data = revert.data.as_ref();

        if data.starts_with(&OwnableUnauthorizedAccount::SELECTOR) {
            return true;
        }

        match Revert::abi_decode(data, true) {
            Ok(decoded) => decoded.reason == OWNABLE_V4_REASON,
            Err(_) => false,
        }
    }
}

/// Encode an `Error(string)` revert payload
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    Revert {
        reason: reason.to_string(),
    }
    .abi_encode()
}

/// Encode the v5 `OwnableUnauthorizedAccount(account)` payload
pub fn encode_unauthorized_account(account: alloy::primitives::Address) -> Vec<u8> {
    OwnableUnauthorizedAccount { account }.abi_encode()
}
