//! Swap conformance runner
//!
//! Drives an adapter through the deposit-then-swap lifecycle and checks the
//! properties every adapter must honor:
//!
//! - the quote never exceeds what the swap delivers, and falls short by at
//!   most the underquoting tolerance
//! - the swap consumes exactly what was deposited
//! - a swap with too little deposited reverts
//! - overprovided tokens can be rescued by the owner or swapped by anyone
//! - native currency sent to the adapter can only be recovered by the owner
//!
//! A runner only exists after [`SwapConformanceRunner::setup`] verified the
//! adapter's token registration, so nothing runs past a setup failure.

mod matrix;

pub use matrix::{scenario_matrix, MatrixPlan, MatrixReport, ScenarioFailure};

use crate::fixture::TestFixture;
use alloy::primitives::{Address, U256};
use swap_adapter_rs::testing::{
    assert_authorized, assert_balance_decreased_by, assert_balance_increased_by, assert_denied,
    assert_no_stranded_deposit, assert_quote_bound,
};
use swap_adapter_rs::{
    to_token_units, HarnessError, HarnessResult, InvariantViolation, PoolToken, Scenario,
};
use tracing::{debug, error, info, warn};

/// Whole tokens used by the boundary tests
pub const BOUNDARY_AMOUNT: u128 = 10;
/// Native currency sent to the adapter by the gas recovery test, in wei
pub const GAS_RESCUE_WEI: u64 = 42_690;
/// Scenarios between registration checks during a sweep
pub const REGISTRATION_CHECK_INTERVAL: usize = 10;

/// Overprovided amount for the boundary tests: 4.2 whole tokens
pub fn overprovided_amount(decimals: u8) -> U256 {
    to_token_units(42, decimals) / U256::from(10u64)
}

/// Conformance runner bound to a fixture
pub struct SwapConformanceRunner<'f> {
    fixture: &'f TestFixture,
    /// `tokenIndex` of every fixture token, as observed at setup
    registration: Vec<u64>,
}

impl<'f> SwapConformanceRunner<'f> {
    /// Verify every fixture token is registered with the adapter at its own
    /// position. Any mismatch is a configuration error.
    pub async fn setup(fixture: &'f TestFixture) -> HarnessResult<Self> {
        info!(
            adapter = %fixture.adapter.address(),
            tokens = fixture.tokens.len(),
            tolerance = %fixture.tolerance,
            "Setting up conformance runner"
        );

        let registration = read_registration(fixture).await?;
        for (position, (token, index)) in fixture.tokens.iter().zip(&registration).enumerate() {
            if *index != position as u64 {
                return Err(HarnessError::configuration(format!(
                    "{} is registered at index {}, expected {}",
                    token, index, position
                )));
            }
        }

        Ok(Self {
            fixture,
            registration,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        self.fixture
    }

    /// Fail if the adapter's token registration changed since setup
    pub async fn check_registration(&self) -> HarnessResult<()> {
        let current = read_registration(self.fixture).await?;
        if current != self.registration {
            return Err(HarnessError::configuration(format!(
                "adapter token registration changed during the run: {:?} -> {:?}",
                self.registration, current
            )));
        }
        Ok(())
    }

    /// The adapter wraps the configured pool
    pub async fn check_pool(&self) -> HarnessResult<()> {
        let pool = self
            .fixture
            .adapter
            .pool()
            .await
            .map_err(|e| no_revert(e, "pool()"))?;

        if pool != self.fixture.expected_pool {
            return Err(HarnessError::configuration(format!(
                "adapter wraps pool {}, expected {}",
                pool, self.fixture.expected_pool
            )));
        }
        Ok(())
    }

    /// Run every scenario of `plan`.
    ///
    /// Invariant violations are collected and the sweep continues. A fatal
    /// error stops it and is recorded as the abort reason. Registration is
    /// re-checked every [`REGISTRATION_CHECK_INTERVAL`] scenarios, after the
    /// first violation and at the end.
    pub async fn run_matrix(&self, plan: &MatrixPlan) -> MatrixReport {
        let mut report = MatrixReport::new(plan.name.clone());

        for index in plan.tokens_from.iter().chain(&plan.tokens_to) {
            if let Err(e) = self.fixture.token(*index) {
                error!(error = %e, "Invalid sweep plan");
                report.abort(e.to_string());
                return report;
            }
        }

        info!(
            sweep = %plan.name,
            scenarios = plan.scenario_count(),
            "Starting swap sweep"
        );

        for scenario in scenario_matrix(plan, &self.fixture.tokens) {
            let first_failure = match self.run_scenario(&scenario).await {
                Ok(()) => {
                    report.record_pass();
                    false
                }
                Err(HarnessError::Invariant(violation)) => {
                    let failure = self.failure(&scenario, violation);
                    warn!(failure = %failure, "Scenario failed");
                    report.record_failure(failure);
                    report.failures.len() == 1
                }
                Err(e) => {
                    error!(scenario = %scenario, error = %e, "Sweep aborted");
                    report.abort(format!("scenario {}: {}", scenario, e));
                    return report;
                }
            };

            if first_failure || report.executed % REGISTRATION_CHECK_INTERVAL == 0 {
                if let Err(e) = self.check_registration().await {
                    error!(scenario = %scenario, error = %e, "Registration drifted mid-sweep");
                    report.abort(e.to_string());
                    return report;
                }
            }
        }

        if let Err(e) = self.check_registration().await {
            error!(error = %e, "Registration check failed after sweep");
            report.abort(e.to_string());
        }

        info!(
            sweep = %plan.name,
            passed = report.passed,
            failed = report.failures.len(),
            "Sweep finished"
        );
        report
    }

    /// Deposit, quote, swap and check one scenario
    pub async fn run_scenario(&self, scenario: &Scenario) -> HarnessResult<()> {
        let fixture = self.fixture;
        let from = fixture.token(scenario.token_from)?;
        let to = fixture.token(scenario.token_to)?;
        let recipient = fixture.recipient();
        let amount = scenario.amount;

        debug!(scenario = %scenario, from = %from.symbol, to = %to.symbol, "Running scenario");

        let deposit = self.deposit_address(from, to).await?;
        let residual_before = self.balance(from, deposit).await?;
        let recipient_before = self.balance(to, recipient).await?;

        self.fund_deposit(from, deposit, amount).await?;

        let quoted = match fixture.adapter.query(amount, from.address, to.address).await {
            Ok(quoted) => quoted,
            Err(HarnessError::Reverted(revert)) => {
                return Err(InvariantViolation::QueryReverted(revert.to_string()).into())
            }
            Err(e) => return Err(e),
        };

        match fixture
            .adapter
            .swap(fixture.owner, amount, from.address, to.address, recipient)
            .await
        {
            Ok(outcome) => debug!(tx = %outcome.tx_hash, fee = %outcome.fee, "Swap confirmed"),
            Err(HarnessError::Reverted(revert)) => {
                return Err(InvariantViolation::SwapReverted(revert.to_string()).into())
            }
            Err(e) => return Err(e),
        }

        let recipient_after = self.balance(to, recipient).await?;
        let actual = recipient_after.saturating_sub(recipient_before);
        assert_quote_bound(quoted, actual, fixture.tolerance, fixture.check_underquoting)?;

        let residual_after = self.balance(from, deposit).await?;
        assert_no_stranded_deposit(deposit, residual_before, residual_after)?;

        Ok(())
    }

    /// Depositing one raw unit less than declared must make the swap revert
    pub async fn check_short_deposit_rejected(&self) -> HarnessResult<()> {
        let fixture = self.fixture;
        let (from, to) = (fixture.token(0)?, fixture.token(1)?);
        let amount = from.units(BOUNDARY_AMOUNT);
        let short = amount - U256::from(1u64);

        let deposit = self.deposit_address(from, to).await?;
        self.fund_deposit(from, deposit, short).await?;

        match fixture
            .adapter
            .swap(fixture.owner, amount, from.address, to.address, fixture.owner)
            .await
        {
            Ok(_) => Err(InvariantViolation::ShortDepositAccepted {
                declared: amount,
                deposited: short,
            }
            .into()),
            Err(HarnessError::Reverted(revert)) => {
                debug!(revert = %revert, "Short deposit rejected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Leftover tokens from an overprovided deposit can be recovered by the
    /// owner and only by the owner
    pub async fn check_owner_rescues_overprovided(&self) -> HarnessResult<()> {
        let fixture = self.fixture;
        let from = fixture.token(0)?;
        let extra = self.overprovide().await?;

        let denied = fixture
            .adapter
            .recover_erc20(fixture.dude, from.address, extra)
            .await;
        assert_denied(denied, fixture.access.as_ref(), "recoverERC20", fixture.dude)?;

        let before = self.balance(from, fixture.owner).await?;
        let rescued = fixture
            .adapter
            .recover_erc20(fixture.owner, from.address, extra)
            .await;
        assert_authorized(rescued, "recoverERC20", fixture.owner)?;
        let after = self.balance(from, fixture.owner).await?;

        assert_balance_increased_by(fixture.owner, before, after, extra)?;
        Ok(())
    }

    /// Leftover tokens from an overprovided deposit can be swapped by anyone,
    /// who receives `query(extra) + tolerance`
    pub async fn check_anyone_claims_overprovided(&self) -> HarnessResult<()> {
        let fixture = self.fixture;
        let (from, to) = (fixture.token(0)?, fixture.token(1)?);
        let extra = self.overprovide().await?;

        let quoted = match fixture.adapter.query(extra, from.address, to.address).await {
            Ok(quoted) => quoted,
            Err(HarnessError::Reverted(revert)) => {
                return Err(InvariantViolation::QueryReverted(revert.to_string()).into())
            }
            Err(e) => return Err(e),
        };

        let before = self.balance(to, fixture.dude).await?;
        let claimed = fixture
            .adapter
            .swap(fixture.dude, extra, from.address, to.address, fixture.dude)
            .await;
        assert_authorized(claimed, "swap", fixture.dude)?;
        let after = self.balance(to, fixture.dude).await?;

        assert_balance_increased_by(fixture.dude, before, after, quoted + fixture.tolerance.value())?;
        Ok(())
    }

    /// Native currency sent to the adapter can be recovered by the owner
    /// with exact balance deltas, and by nobody else
    pub async fn check_owner_rescues_gas(&self) -> HarnessResult<()> {
        let fixture = self.fixture;
        let adapter = fixture.adapter.address();
        let amount = U256::from(GAS_RESCUE_WEI);

        let adapter_before = self.native(adapter).await?;
        fixture
            .ledger
            .send_native(fixture.owner, adapter, amount)
            .await
            .map_err(|e| no_revert(e, "sending native currency to the adapter"))?;
        let adapter_funded = self.native(adapter).await?;
        assert_balance_increased_by(adapter, adapter_before, adapter_funded, amount)?;

        let denied = fixture.adapter.recover_gas(fixture.dude, amount).await;
        assert_denied(denied, fixture.access.as_ref(), "recoverGAS", fixture.dude)?;

        let owner_before = self.native(fixture.owner).await?;
        let rescued = fixture.adapter.recover_gas(fixture.owner, amount).await;
        let outcome = assert_authorized(rescued, "recoverGAS", fixture.owner)?;
        let owner_after = self.native(fixture.owner).await?;
        let adapter_after = self.native(adapter).await?;

        assert_balance_decreased_by(adapter, adapter_funded, adapter_after, amount)?;
        // The owner paid gas for the recovery itself
        assert_balance_increased_by(fixture.owner, owner_before, owner_after + outcome.fee, amount)?;
        Ok(())
    }

    /// Deposit `BOUNDARY_AMOUNT` plus the overprovided amount of token 0 and
    /// swap only `BOUNDARY_AMOUNT` into token 1; returns the leftover.
    async fn overprovide(&self) -> HarnessResult<U256> {
        let fixture = self.fixture;
        let (from, to) = (fixture.token(0)?, fixture.token(1)?);
        let amount = from.units(BOUNDARY_AMOUNT);
        let extra = overprovided_amount(from.decimals);

        let deposit = self.deposit_address(from, to).await?;
        self.fund_deposit(from, deposit, amount + extra).await?;

        let swapped = fixture
            .adapter
            .swap(fixture.owner, amount, from.address, to.address, fixture.owner)
            .await;
        match swapped {
            Ok(_) => Ok(extra),
            Err(HarnessError::Reverted(revert)) => {
                Err(InvariantViolation::SwapReverted(revert.to_string()).into())
            }
            Err(e) => Err(e),
        }
    }

    async fn deposit_address(&self, from: &PoolToken, to: &PoolToken) -> HarnessResult<Address> {
        self.fixture
            .adapter
            .deposit_address(from.address, to.address)
            .await
            .map_err(|e| no_revert(e, "depositAddress()"))
    }

    async fn fund_deposit(&self, token: &PoolToken, deposit: Address, amount: U256) -> HarnessResult<()> {
        self.fixture
            .ledger
            .transfer(self.fixture.owner, token.address, deposit, amount)
            .await
            .map_err(|e| no_revert(e, "funding the deposit address"))?;
        Ok(())
    }

    async fn balance(&self, token: &PoolToken, account: Address) -> HarnessResult<U256> {
        self.fixture
            .ledger
            .token_balance(token.address, account)
            .await
            .map_err(|e| no_revert(e, "balanceOf()"))
    }

    async fn native(&self, account: Address) -> HarnessResult<U256> {
        self.fixture.ledger.native_balance(account).await
    }

    fn failure(&self, scenario: &Scenario, violation: InvariantViolation) -> ScenarioFailure {
        let symbol = |i: usize| {
            self.fixture
                .tokens
                .get(i)
                .map(|t| t.symbol.clone())
                .unwrap_or_else(|| format!("#{}", i))
        };
        ScenarioFailure {
            scenario: scenario.clone(),
            from_symbol: symbol(scenario.token_from),
            to_symbol: symbol(scenario.token_to),
            violation,
        }
    }
}

async fn read_registration(fixture: &TestFixture) -> HarnessResult<Vec<u64>> {
    let mut indices = Vec::with_capacity(fixture.tokens.len());
    for token in &fixture.tokens {
        let registered = fixture
            .adapter
            .is_pool_token(token.address)
            .await
            .map_err(|e| no_revert(e, "isPoolToken()"))?;
        if !registered {
            return Err(HarnessError::configuration(format!(
                "{} is not a pool token of the adapter",
                token
            )));
        }

        let index = fixture
            .adapter
            .token_index(token.address)
            .await
            .map_err(|e| no_revert(e, "tokenIndex()"))?;
        indices.push(index);
    }
    Ok(indices)
}

/// A revert where none is expected means the harness is pointed at the
/// wrong contract
fn no_revert(err: HarnessError, what: &str) -> HarnessError {
    match err {
        HarnessError::Reverted(revert) => {
            HarnessError::configuration(format!("{} reverted: {}", what, revert))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::test_support::mock_fixture;
    use std::sync::Arc;
    use swap_adapter_rs::testing::{DenialStyle, MockVenue, VenueBehavior};
    use swap_adapter_rs::{Ledger, UnderquotingTolerance};

    async fn venue_with(behavior: VenueBehavior) -> (Arc<MockVenue>, TestFixture) {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue.clone()).await;
        venue.set_behavior(behavior);
        (venue, fixture)
    }

    fn small_plan(fixture: &TestFixture, repetitions: u32) -> MatrixPlan {
        MatrixPlan::all_pairs("small", fixture.tokens.len(), vec![8, 1001], repetitions)
    }

    #[test]
    fn test_overprovided_amount() {
        assert_eq!(
            overprovided_amount(18),
            U256::from(42u64) * U256::from(10u64).pow(U256::from(17u64))
        );
        assert_eq!(overprovided_amount(6), U256::from(4_200_000u64));
    }

    #[tokio::test]
    async fn test_setup_accepts_correct_registration() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        assert_eq!(runner.registration, vec![0, 1, 2]);
        tokio_test::assert_ok!(runner.check_pool().await);
    }

    #[tokio::test]
    async fn test_setup_rejects_misordered_tokens() {
        let (_, mut fixture) = venue_with(VenueBehavior::curve_like()).await;
        fixture.tokens.swap(0, 1);

        let err = SwapConformanceRunner::setup(&fixture).await.err().unwrap();
        assert!(matches!(err, HarnessError::Configuration(_)));
        assert!(err.to_string().contains("registered at index 1, expected 0"));
    }

    #[tokio::test]
    async fn test_setup_rejects_foreign_token() {
        let (_, mut fixture) = venue_with(VenueBehavior::curve_like()).await;
        fixture.tokens[2].address = Address::with_last_byte(0x99);

        let err = SwapConformanceRunner::setup(&fixture).await.err().unwrap();
        assert!(err.to_string().contains("not a pool token"));
    }

    #[tokio::test]
    async fn test_check_pool_mismatch() {
        let (_, mut fixture) = venue_with(VenueBehavior::curve_like()).await;
        fixture.expected_pool = Address::with_last_byte(0x01);

        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        assert!(runner.check_pool().await.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_matrix_passes_for_honest_adapter() {
        let (venue, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let report = runner.run_matrix(&small_plan(&fixture, 2)).await;

        assert!(report.is_success(), "{}", report);
        assert_eq!(report.executed, 24);
        assert_eq!(venue.swap_count(), 24);
    }

    #[tokio::test]
    async fn test_matrix_collects_overquotes_without_stopping() {
        let (_, fixture) = venue_with(VenueBehavior {
            overquote_by: U256::from(1u64),
            ..Default::default()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;

        assert!(report.aborted.is_none());
        assert_eq!(report.executed, 12);
        assert_eq!(report.failures.len(), 12);
        assert!(matches!(
            report.failures[0].violation,
            InvariantViolation::Overquoted { .. }
        ));
        assert_eq!(report.failures[0].scenario.sequence, 1);
        assert_eq!(report.failures[0].from_symbol, "DAI");
    }

    #[tokio::test]
    async fn test_matrix_underquote_beyond_tolerance() {
        let (_, mut fixture) = venue_with(VenueBehavior {
            underquote_by: U256::from(2u64),
            ..Default::default()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.violation, InvariantViolation::Underquoted { .. })));
        assert_eq!(report.failures.len(), 12);

        // Only the lower bound is checked with underquoting checks off
        fixture.check_underquoting = false;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        assert!(runner.run_matrix(&small_plan(&fixture, 1)).await.is_success());

        // A wider tolerance also accepts it
        fixture.check_underquoting = true;
        fixture.tolerance = UnderquotingTolerance::new(2);
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        assert!(runner.run_matrix(&small_plan(&fixture, 1)).await.is_success());
    }

    #[tokio::test]
    async fn test_matrix_detects_stranded_deposits() {
        let (_, fixture) = venue_with(VenueBehavior {
            ignore_deposits: true,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;
        assert!(!report.failures.is_empty());
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.violation, InvariantViolation::StrandedDeposit { .. })));
    }

    #[tokio::test]
    async fn test_matrix_aborts_on_registration_drift() {
        let (_, fixture) = venue_with(VenueBehavior {
            reindex_after_swaps: Some(3),
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;
        assert!(report.failures.is_empty());
        assert!(report
            .aborted
            .as_deref()
            .unwrap()
            .contains("registration changed"));
    }

    #[tokio::test]
    async fn test_matrix_detects_drift_before_sweep_ends() {
        let (_, fixture) = venue_with(VenueBehavior {
            reindex_after_swaps: Some(3),
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let plan = small_plan(&fixture, 4);
        let report = runner.run_matrix(&plan).await;
        assert!(plan.scenario_count() > REGISTRATION_CHECK_INTERVAL);
        assert_eq!(report.executed, REGISTRATION_CHECK_INTERVAL);
        assert!(report
            .aborted
            .as_deref()
            .unwrap()
            .contains("registration changed"));
    }

    #[tokio::test]
    async fn test_matrix_rechecks_registration_on_first_failure() {
        let (venue, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        venue.set_behavior(VenueBehavior {
            overquote_by: U256::from(1u64),
            reindex_after_swaps: Some(1),
            ..Default::default()
        });

        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;
        assert_eq!(report.executed, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.aborted.is_some());
    }

    #[tokio::test]
    async fn test_matrix_aborts_on_unfundable_deposit() {
        let (venue, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let dai = fixture.tokens[0].clone();
        let owner_balance = venue.token_balance(dai.address, fixture.owner).await.unwrap();
        venue
            .transfer(fixture.owner, dai.address, fixture.dude, owner_balance)
            .await
            .unwrap();

        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        let report = runner.run_matrix(&small_plan(&fixture, 1)).await;

        assert_eq!(report.executed, 0);
        assert!(report.aborted.as_deref().unwrap().contains("#1"));
    }

    #[tokio::test]
    async fn test_matrix_rejects_out_of_range_plan() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let plan = MatrixPlan::all_pairs("bad", 4, vec![8], 1);
        let report = runner.run_matrix(&plan).await;
        assert_eq!(report.executed, 0);
        assert!(report.aborted.is_some());
    }

    #[tokio::test]
    async fn test_short_deposit_check() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        tokio_test::assert_ok!(runner.check_short_deposit_rejected().await);

        let (_, fixture) = venue_with(VenueBehavior {
            accept_short_deposits: true,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        let err = runner.check_short_deposit_rejected().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Invariant(InvariantViolation::ShortDepositAccepted { .. })
        ));
    }

    #[tokio::test]
    async fn test_owner_rescue_check() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        tokio_test::assert_ok!(runner.check_owner_rescues_overprovided().await);
    }

    #[tokio::test]
    async fn test_owner_rescue_accepts_custom_error_denial() {
        let (_, fixture) = venue_with(VenueBehavior {
            denial_style: DenialStyle::CustomError,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        tokio_test::assert_ok!(runner.check_owner_rescues_overprovided().await);
    }

    #[tokio::test]
    async fn test_owner_rescue_flags_open_recovery() {
        let (_, fixture) = venue_with(VenueBehavior {
            open_recovery: true,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let err = runner.check_owner_rescues_overprovided().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Invariant(InvariantViolation::UnauthorizedCallSucceeded {
                operation: "recoverERC20",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_owner_rescue_flags_wrong_denial_reason() {
        let (_, fixture) = venue_with(VenueBehavior {
            denial_style: DenialStyle::Bare,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let err = runner.check_owner_rescues_overprovided().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Invariant(InvariantViolation::UnexpectedRejection { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_claim_check() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        tokio_test::assert_ok!(runner.check_anyone_claims_overprovided().await);
    }

    #[tokio::test]
    async fn test_open_claim_requires_tolerance_payout() {
        // An exact quote pays query(extra), one unit short of query + tolerance
        let (_, fixture) = venue_with(VenueBehavior::default()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let err = runner.check_anyone_claims_overprovided().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Invariant(InvariantViolation::BalanceDelta { .. })
        ));
    }

    #[tokio::test]
    async fn test_gas_rescue_check() {
        let (_, fixture) = venue_with(VenueBehavior::curve_like()).await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();
        tokio_test::assert_ok!(runner.check_owner_rescues_gas().await);
    }

    #[tokio::test]
    async fn test_gas_rescue_flags_open_recovery() {
        let (_, fixture) = venue_with(VenueBehavior {
            open_recovery: true,
            ..VenueBehavior::curve_like()
        })
        .await;
        let runner = SwapConformanceRunner::setup(&fixture).await.unwrap();

        let err = runner.check_owner_rescues_gas().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Invariant(InvariantViolation::UnauthorizedCallSucceeded {
                operation: "recoverGAS",
                ..
            })
        ));
    }
}
