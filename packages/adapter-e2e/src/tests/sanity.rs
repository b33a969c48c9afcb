//! Sanity checks: registration, deposit boundaries and owner-gated recovery

use super::CaseOutcome;
use crate::runner::SwapConformanceRunner;
use tracing::info;

/// The adapter wraps the configured pool and registers every token at its
/// configured position
pub async fn test_adapter_setup(runner: &SwapConformanceRunner<'_>) -> CaseOutcome {
    let result = async {
        runner.check_pool().await?;
        runner.check_registration().await
    }
    .await;

    if result.is_ok() {
        let fixture = runner.fixture();
        for (index, token) in fixture.tokens.iter().enumerate() {
            info!(index, token = %token, "Pool token registered");
        }
    }
    result.into()
}

/// A swap of more than was deposited reverts
pub async fn test_short_deposit_reverts(runner: &SwapConformanceRunner<'_>) -> CaseOutcome {
    runner.check_short_deposit_rejected().await.into()
}

/// Only the owner can rescue overprovided tokens
pub async fn test_owner_rescues_overprovided(runner: &SwapConformanceRunner<'_>) -> CaseOutcome {
    runner.check_owner_rescues_overprovided().await.into()
}

/// Anyone can swap overprovided tokens and keep the output
pub async fn test_anyone_claims_overprovided(runner: &SwapConformanceRunner<'_>) -> CaseOutcome {
    runner.check_anyone_claims_overprovided().await.into()
}

/// Only the owner can rescue native currency from the adapter
pub async fn test_owner_rescues_gas(runner: &SwapConformanceRunner<'_>) -> CaseOutcome {
    runner.check_owner_rescues_gas().await.into()
}
