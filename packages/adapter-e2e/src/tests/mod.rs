//! Conformance test catalogue
//!
//! - **sanity**: pool and registration, short deposit, overprovided token
//!   rescue and claim, native currency rescue
//! - **swaps**: small-medium and big sweeps over every ordered token pair
//!
//! Every test starts from the same chain snapshot, taken right after the
//! fixture was built.

mod sanity;

pub use sanity::*;
pub use swaps::*;

use crate::balance_setter::{StorageSlotBalanceSetter, LAYOUT_ACCOUNT};
use crate::config::SweepConfig;
use crate::fixture::{Checkpoint, TestFixture};
use crate::runner::SwapConformanceRunner;
use crate::{TestResult, TestSuite};
use std::time::Instant;
use swap_adapter_rs::HarnessResult;
use tracing::{error, info};

/// Boundary and authorization tests, in run order
pub const SANITY_TESTS: [&str; 5] = [
    "adapter_setup",
    "short_deposit_reverts",
    "owner_rescues_overprovided",
    "anyone_claims_overprovided",
    "owner_rescues_gas",
];

/// Swap sweeps, in run order
pub const SWAP_TESTS: [&str; 2] = ["swaps_small", "swaps_big"];

/// Which tests to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Sanity tests only
    Quick,
    Single(String),
}

impl Selection {
    fn names(&self) -> Vec<String> {
        match self {
            Self::All => SANITY_TESTS
                .iter()
                .chain(SWAP_TESTS.iter())
                .map(|s| s.to_string())
                .collect(),
            Self::Quick => SANITY_TESTS.iter().map(|s| s.to_string()).collect(),
            Self::Single(name) => vec![name.clone()],
        }
    }
}

/// Result of one catalogue entry before timing is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    /// A fatal error; nothing after it is meaningful
    Aborted(String),
}

impl From<HarnessResult<()>> for CaseOutcome {
    fn from(result: HarnessResult<()>) -> Self {
        match result {
            Ok(()) => Self::Passed,
            Err(e) if e.is_fatal() => Self::Aborted(e.to_string()),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Run one catalogue entry by name; `None` if there is no such test
pub async fn run_case(
    runner: &SwapConformanceRunner<'_>,
    name: &str,
    sweep: &SweepConfig,
) -> Option<CaseOutcome> {
    let outcome = match name {
        "adapter_setup" => test_adapter_setup(runner).await,
        "short_deposit_reverts" => test_short_deposit_reverts(runner).await,
        "owner_rescues_overprovided" => test_owner_rescues_overprovided(runner).await,
        "anyone_claims_overprovided" => test_anyone_claims_overprovided(runner).await,
        "owner_rescues_gas" => test_owner_rescues_gas(runner).await,
        "swaps_small" => test_swaps_small(runner, sweep).await,
        "swaps_big" => test_swaps_big(runner, sweep).await,
        _ => return None,
    };
    Some(outcome)
}

/// Run the selected tests against `fixture`.
///
/// A setup failure or any fatal error marks the suite aborted; remaining
/// tests are reported as skipped.
pub async fn run_conformance(
    fixture: &TestFixture,
    sweep: &SweepConfig,
    selection: &Selection,
) -> TestSuite {
    let mut suite = TestSuite::new("Adapter Conformance");
    let names = selection.names();

    let start = Instant::now();
    let prepared = async {
        let checkpoint = Checkpoint::take(fixture.node.clone()).await?;
        let runner = SwapConformanceRunner::setup(fixture).await?;
        HarnessResult::Ok((checkpoint, runner))
    }
    .await;

    let (mut checkpoint, runner) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, "Setup failed");
            suite.add_result(TestResult::fail("setup", e.to_string(), start.elapsed()));
            suite.abort(format!("setup failed: {}", e));
            skip_remaining(&mut suite, &names);
            return suite;
        }
    };

    for name in &names {
        if suite.is_aborted() {
            suite.add_result(TestResult::skip(name, "run aborted"));
            continue;
        }

        info!(test = %name, "Running test");
        let start = Instant::now();

        if let Err(e) = checkpoint.restore().await {
            suite.add_result(TestResult::fail(name, e.to_string(), start.elapsed()));
            suite.abort(format!("could not reset chain state: {}", e));
            continue;
        }

        let result = match run_case(&runner, name, sweep).await {
            None => TestResult::fail(name, format!("Unknown test: {}", name), start.elapsed()),
            Some(CaseOutcome::Passed) => TestResult::pass(name, start.elapsed()),
            Some(CaseOutcome::Failed(reason)) => TestResult::fail(name, reason, start.elapsed()),
            Some(CaseOutcome::Aborted(reason)) => {
                error!(test = %name, reason = %reason, "Run aborted");
                suite.abort(format!("{}: {}", name, reason));
                TestResult::fail(name, reason, start.elapsed())
            }
        };
        info!("{}", result);
        suite.add_result(result);
    }

    suite
}

/// Verify the balance-mapping slot of every fixture token, leaving chain
/// state as it was
pub async fn run_slot_checks(fixture: &TestFixture) -> TestSuite {
    let mut suite = TestSuite::new("Balance Slot Layout");

    let mut checkpoint = match Checkpoint::take(fixture.node.clone()).await {
        Ok(checkpoint) => checkpoint,
        Err(e) => {
            suite.abort(e.to_string());
            return suite;
        }
    };

    let setter = StorageSlotBalanceSetter::new(fixture.node.as_ref(), fixture.ledger.as_ref());
    for token in &fixture.tokens {
        let name = format!("balance_slot_{}", token.symbol.to_lowercase());
        let start = Instant::now();
        let result = match setter.verify_layout(token, LAYOUT_ACCOUNT).await {
            Ok(()) => TestResult::pass(name, start.elapsed()),
            Err(e) => TestResult::fail(name, e.to_string(), start.elapsed()),
        };
        suite.add_result(result);
    }

    if let Err(e) = checkpoint.restore().await {
        suite.abort(format!("could not reset chain state: {}", e));
    }
    suite
}

fn skip_remaining(suite: &mut TestSuite, names: &[String]) {
    for name in names {
        suite.add_result(TestResult::skip(name, "run aborted"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::test_support::mock_fixture;
    use std::sync::Arc;
    use swap_adapter_rs::testing::{MockVenue, VenueBehavior};

    fn quick_sweep() -> SweepConfig {
        SweepConfig {
            amounts: vec![8, 1001],
            amounts_big: vec![10200300],
            repetitions: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_run_passes_for_honest_adapter() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue).await;

        let suite = run_conformance(&fixture, &quick_sweep(), &Selection::All).await;

        assert_eq!(suite.total(), 7);
        assert!(suite.all_passed(), "{}", suite);
        assert!(!suite.is_aborted());
    }

    #[tokio::test]
    async fn test_quick_selection_runs_sanity_only() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue.clone()).await;

        let suite = run_conformance(&fixture, &quick_sweep(), &Selection::Quick).await;

        assert_eq!(suite.total(), SANITY_TESTS.len());
        assert_eq!(suite.passed(), SANITY_TESTS.len());
    }

    #[tokio::test]
    async fn test_each_test_starts_from_snapshot() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue.clone()).await;

        run_conformance(&fixture, &quick_sweep(), &Selection::All).await;

        // Only the last test's swaps survive; earlier ones were reverted
        assert_eq!(venue.swap_count(), 6);
    }

    #[tokio::test]
    async fn test_unknown_single_test_fails() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue).await;

        let selection = Selection::Single("no_such_test".into());
        let suite = run_conformance(&fixture, &quick_sweep(), &selection).await;

        assert_eq!(suite.failed(), 1);
        assert!(!suite.is_aborted());
    }

    #[tokio::test]
    async fn test_violations_do_not_abort() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue.clone()).await;
        venue.set_behavior(VenueBehavior {
            open_recovery: true,
            ..VenueBehavior::curve_like()
        });

        let suite = run_conformance(&fixture, &quick_sweep(), &Selection::All).await;

        assert_eq!(suite.failed(), 2);
        assert_eq!(suite.passed(), 5);
        assert!(!suite.is_aborted());
    }

    #[tokio::test]
    async fn test_setup_failure_aborts_and_skips() {
        let venue = Arc::new(MockVenue::stable_pool());
        let mut fixture = mock_fixture(venue).await;
        fixture.tokens.reverse();

        let suite = run_conformance(&fixture, &quick_sweep(), &Selection::All).await;

        assert!(suite.is_aborted());
        assert_eq!(suite.failed(), 1);
        assert_eq!(suite.skipped(), 7);
        assert!(!suite.all_passed());
    }

    #[tokio::test]
    async fn test_fatal_sweep_error_skips_rest() {
        let venue = Arc::new(MockVenue::stable_pool());
        let fixture = mock_fixture(venue.clone()).await;
        venue.set_behavior(VenueBehavior {
            reindex_after_swaps: Some(1),
            ..VenueBehavior::curve_like()
        });

        let suite = run_conformance(&fixture, &quick_sweep(), &Selection::All).await;

        // swaps_small sees the drift at its closing registration check
        assert!(suite.is_aborted());
        assert_eq!(suite.skipped(), 1);
    }

    #[tokio::test]
    async fn test_slot_checks() {
        let venue = Arc::new(MockVenue::stable_pool());
        let mut fixture = mock_fixture(venue).await;

        let suite = run_slot_checks(&fixture).await;
        assert_eq!(suite.passed(), 3);

        fixture.tokens[1].balance_slot = 3;
        let suite = run_slot_checks(&fixture).await;
        assert_eq!(suite.failed(), 1);
    }
}
