//! Scenario sweep: plan, lazy scenario stream, aggregated report

use std::fmt;
use swap_adapter_rs::{InvariantViolation, PoolToken, Scenario};

/// Token pairs, amounts and repetitions of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixPlan {
    pub name: String,
    pub tokens_from: Vec<usize>,
    pub tokens_to: Vec<usize>,
    /// Whole-token amounts, scaled by the input token's decimals
    pub amounts: Vec<u128>,
    pub repetitions: u32,
}

impl MatrixPlan {
    /// Every ordered pair of `token_count` tokens
    pub fn all_pairs(
        name: impl Into<String>,
        token_count: usize,
        amounts: Vec<u128>,
        repetitions: u32,
    ) -> Self {
        Self {
            name: name.into(),
            tokens_from: (0..token_count).collect(),
            tokens_to: (0..token_count).collect(),
            amounts,
            repetitions,
        }
    }

    /// Number of scenarios the plan expands to
    pub fn scenario_count(&self) -> usize {
        let pairs: usize = self
            .tokens_from
            .iter()
            .map(|i| self.tokens_to.iter().filter(|j| *j != i).count())
            .sum();
        pairs * self.amounts.len() * self.repetitions as usize
    }
}

/// Expand `plan` lazily into scenarios numbered from 1.
///
/// Order: repetition, then input token, then output token, then amount.
/// Pairs with the same input and output token are skipped. Every index in
/// the plan must be valid for `tokens`.
pub fn scenario_matrix<'a>(
    plan: &'a MatrixPlan,
    tokens: &'a [PoolToken],
) -> impl Iterator<Item = Scenario> + 'a {
    (0..plan.repetitions)
        .flat_map(move |_| {
            plan.tokens_from.iter().flat_map(move |&i| {
                plan.tokens_to
                    .iter()
                    .filter(move |&&j| j != i)
                    .flat_map(move |&j| plan.amounts.iter().map(move |&whole| (i, j, whole)))
            })
        })
        .enumerate()
        .map(move |(n, (i, j, whole))| Scenario {
            token_from: i,
            token_to: j,
            whole_amount: whole,
            amount: tokens[i].units(whole),
            sequence: n as u64 + 1,
        })
}

/// An invariant violation pinned to the scenario that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioFailure {
    pub scenario: Scenario,
    pub from_symbol: String,
    pub to_symbol: String,
    pub violation: InvariantViolation,
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> {} amount {} ({} raw): {}",
            self.scenario.sequence,
            self.from_symbol,
            self.to_symbol,
            self.scenario.whole_amount,
            self.scenario.amount,
            self.violation
        )
    }
}

/// Outcome of a sweep, built incrementally
#[derive(Debug, Clone, Default)]
pub struct MatrixReport {
    pub name: String,
    pub executed: usize,
    pub passed: usize,
    pub failures: Vec<ScenarioFailure>,
    /// Set when a fatal error stopped the sweep
    pub aborted: Option<String>,
}

impl MatrixReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn record_pass(&mut self) {
        self.executed += 1;
        self.passed += 1;
    }

    pub fn record_failure(&mut self, failure: ScenarioFailure) {
        self.executed += 1;
        self.failures.push(failure);
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    /// One-line description followed by up to `limit` failures
    pub fn describe(&self, limit: usize) -> String {
        let mut out = format!(
            "{}: {}/{} scenarios passed",
            self.name, self.passed, self.executed
        );
        if let Some(reason) = &self.aborted {
            out.push_str(&format!(", aborted: {}", reason));
        }
        for failure in self.failures.iter().take(limit) {
            out.push_str(&format!("\n      {}", failure));
        }
        if self.failures.len() > limit {
            out.push_str(&format!(
                "\n      ... and {} more",
                self.failures.len() - limit
            ));
        }
        out
    }
}

impl fmt::Display for MatrixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    fn tokens() -> Vec<PoolToken> {
        [("DAI", 18u8), ("USDC", 6), ("USDT", 6)]
            .iter()
            .enumerate()
            .map(|(i, (symbol, decimals))| PoolToken {
                symbol: symbol.to_string(),
                address: Address::with_last_byte(i as u8 + 1),
                decimals: *decimals,
                balance_slot: 2,
            })
            .collect()
    }

    #[test]
    fn test_default_sweeps_have_expected_sizes() {
        let tokens = tokens();
        let small = MatrixPlan::all_pairs("small", 3, vec![8, 1001, 96420, 1337000], 5);
        let big = MatrixPlan::all_pairs("big", 3, vec![10200300, 200300400, 100900800700], 5);

        assert_eq!(small.scenario_count(), 120);
        assert_eq!(scenario_matrix(&small, &tokens).count(), 120);
        assert_eq!(big.scenario_count(), 90);
        assert_eq!(scenario_matrix(&big, &tokens).count(), 90);
    }

    #[test]
    fn test_matrix_order_and_numbering() {
        let tokens = tokens();
        let plan = MatrixPlan::all_pairs("order", 3, vec![8, 1001], 2);
        let scenarios: Vec<Scenario> = scenario_matrix(&plan, &tokens).collect();

        assert!(scenarios.iter().all(|s| s.token_from != s.token_to));
        assert_eq!(
            scenarios
                .iter()
                .map(|s| s.sequence)
                .collect::<Vec<_>>(),
            (1..=24).collect::<Vec<u64>>()
        );

        let first: Vec<(usize, usize, u128)> = scenarios
            .iter()
            .take(4)
            .map(|s| (s.token_from, s.token_to, s.whole_amount))
            .collect();
        assert_eq!(first, vec![(0, 1, 8), (0, 1, 1001), (0, 2, 8), (0, 2, 1001)]);

        // Second repetition starts over
        assert_eq!(scenarios[12].token_from, 0);
        assert_eq!(scenarios[12].token_to, 1);
    }

    #[test]
    fn test_amounts_scaled_by_input_decimals() {
        let tokens = tokens();
        let plan = MatrixPlan {
            name: "scale".into(),
            tokens_from: vec![1],
            tokens_to: vec![0],
            amounts: vec![1001],
            repetitions: 1,
        };
        let scenario = scenario_matrix(&plan, &tokens).next().unwrap();
        assert_eq!(scenario.amount, U256::from(1_001_000_000u64));
    }

    #[test]
    fn test_matrix_is_lazy() {
        let tokens = tokens();
        let plan = MatrixPlan::all_pairs("huge", 3, vec![1; 1000], 1_000_000);
        let mut stream = scenario_matrix(&plan, &tokens);
        assert_eq!(stream.nth(2).unwrap().sequence, 3);
    }

    #[test]
    fn test_report_aggregation() {
        let mut report = MatrixReport::new("sweep");
        report.record_pass();
        report.record_failure(ScenarioFailure {
            scenario: Scenario {
                token_from: 0,
                token_to: 1,
                whole_amount: 8,
                amount: U256::from(8u64),
                sequence: 2,
            },
            from_symbol: "DAI".into(),
            to_symbol: "USDC".into(),
            violation: InvariantViolation::SwapReverted("boom".into()),
        });

        assert!(!report.is_success());
        assert_eq!(report.executed, 2);
        let text = report.describe(5);
        assert!(text.contains("1/2 scenarios passed"));
        assert!(text.contains("#2 DAI -> USDC amount 8"));

        report.abort("transport error: connection refused");
        assert!(report.describe(0).contains("aborted"));
    }
}
