//! Conformance Assertions
//!
//! Pure checks used by the runner. Each returns the [`InvariantViolation`]
//! that describes the failure, so callers can attach scenario context.

use crate::error::{CallRevert, HarnessError, InvariantViolation};
use crate::types::{TxOutcome, UnderquotingTolerance};
use crate::AccessControl;
use alloy::primitives::{Address, U256};

/// Assert `quoted <= actual <= quoted + tolerance`.
///
/// With `check_underquoting` off only the lower bound is enforced.
pub fn assert_quote_bound(
    quoted: U256,
    actual: U256,
    tolerance: UnderquotingTolerance,
    check_underquoting: bool,
) -> Result<(), InvariantViolation> {
    if actual < quoted {
        return Err(InvariantViolation::Overquoted { quoted, actual });
    }

    if check_underquoting && actual - quoted > tolerance.value() {
        return Err(InvariantViolation::Underquoted {
            quoted,
            actual,
            tolerance: tolerance.value(),
        });
    }

    Ok(())
}

/// Assert the deposit address did not keep more than its starting residual
pub fn assert_no_stranded_deposit(
    deposit: Address,
    before: U256,
    after: U256,
) -> Result<(), InvariantViolation> {
    if after > before {
        return Err(InvariantViolation::StrandedDeposit {
            deposit,
            before,
            after,
        });
    }
    Ok(())
}

/// Assert a balance grew by exactly `expected`
pub fn assert_balance_increased_by(
    account: Address,
    before: U256,
    after: U256,
    expected: U256,
) -> Result<(), InvariantViolation> {
    if after < before || after - before != expected {
        return Err(InvariantViolation::BalanceDelta {
            account,
            expected: format!("+{}", expected),
            actual: signed_delta(before, after),
        });
    }
    Ok(())
}

/// Assert a balance shrank by exactly `expected`
pub fn assert_balance_decreased_by(
    account: Address,
    before: U256,
    after: U256,
    expected: U256,
) -> Result<(), InvariantViolation> {
    if after > before || before - after != expected {
        return Err(InvariantViolation::BalanceDelta {
            account,
            expected: format!("-{}", expected),
            actual: signed_delta(before, after),
        });
    }
    Ok(())
}

/// Assert a call by a non-privileged caller was denied for lack of authorization.
///
/// Transport and configuration errors are passed through untouched.
pub fn assert_denied(
    result: Result<TxOutcome, HarnessError>,
    access: &dyn AccessControl,
    operation: &'static str,
    caller: Address,
) -> Result<(), HarnessError> {
    match result {
        Ok(_) => Err(InvariantViolation::UnauthorizedCallSucceeded { operation, caller }.into()),
        Err(HarnessError::Reverted(revert)) if access.is_authorization_failure(&revert) => Ok(()),
        Err(HarnessError::Reverted(revert)) => Err(InvariantViolation::UnexpectedRejection {
            operation,
            caller,
            reason: describe_revert(&revert),
        }
        .into()),
        Err(other) => Err(other),
    }
}

/// Assert a privileged call went through
pub fn assert_authorized(
    result: Result<TxOutcome, HarnessError>,
    operation: &'static str,
    caller: Address,
) -> Result<TxOutcome, HarnessError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(HarnessError::Reverted(revert)) => Err(InvariantViolation::AuthorizedCallFailed {
            operation,
            caller,
            reason: describe_revert(&revert),
        }
        .into()),
        Err(other) => Err(other),
    }
}

fn describe_revert(revert: &CallRevert) -> String {
    revert.to_string()
}

fn signed_delta(before: U256, after: U256) -> String {
    if after >= before {
        format!("+{}", after - before)
    } else {
        format!("-{}", before - after)
    }
}
